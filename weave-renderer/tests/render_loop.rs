//! End-to-end render loop behaviour: passes, events, substitution and limits.

use serde_json::json;
use tempfile::TempDir;
use weave_core::{
    config, resource::default_include_path, RenderConfig, ResourceMap, RuntimeContext,
    ViewExtension, ViewScheme,
};
use weave_renderer::{
    EventDispatcher, EventOutcome, RenderError, RenderEvent, RenderEventOptions, Renderer,
    TemplateEngine,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every event together with the page text at dispatch time.
#[derive(Default)]
struct Recorder {
    seen: Vec<(RenderEvent, String)>,
}

impl Recorder {
    fn events(&self) -> Vec<RenderEvent> {
        self.seen.iter().map(|(e, _)| *e).collect()
    }

    fn page_at(&self, event: RenderEvent) -> &str {
        self.seen
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, page)| page.as_str())
            .expect("event was fired")
    }
}

impl EventDispatcher for Recorder {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        self.seen
            .push((event, options.rendered_page.unwrap_or_default().to_string()));
        EventOutcome::unchanged()
    }
}

fn resources(views: &[(ViewScheme, &str)]) -> ResourceMap {
    let mut map = ResourceMap::with_builtins();
    for (scheme, name) in views {
        map.insert(ViewExtension::new(
            *scheme,
            *name,
            default_include_path(*scheme, name),
        ));
    }
    map
}

fn theme() -> ViewExtension {
    ViewExtension::new(ViewScheme::Theme, "default", "theme/default.tera")
}

fn render_with<D: EventDispatcher>(
    views: &[(ViewScheme, &str)],
    templates: &[(&str, &str)],
    runtime: RuntimeContext,
    events: D,
) -> (Result<String, RenderError>, D) {
    let engine = TemplateEngine::from_raw(templates.iter().copied()).expect("engine");
    let mut renderer = Renderer::new(resources(views), engine, events);
    let result = renderer.render(&theme(), runtime);
    (result, renderer.into_events())
}

fn render(views: &[(ViewScheme, &str)], templates: &[(&str, &str)]) -> Result<String, RenderError> {
    render_with(views, templates, RuntimeContext::default(), Recorder::default()).0
}

fn primary_rows(n: usize) -> RuntimeContext {
    let rows: Vec<_> = (1..=n).map(|i| json!({"title": format!("t{i}")})).collect();
    serde_json::from_value(json!({"primary": {"data": rows}})).expect("runtime")
}

// ---------------------------------------------------------------------------
// 1. Substitution
// ---------------------------------------------------------------------------

#[test]
fn zero_tag_document_passes_through_with_page_events_only() {
    let (out, recorder) = render_with(
        &[],
        &[("theme/default.tera", "<p>static</p>")],
        RuntimeContext::default(),
        Recorder::default(),
    );
    assert_eq!(out.expect("render"), "<p>static</p>");
    assert_eq!(
        recorder.events(),
        vec![
            RenderEvent::OnBeforeParse,
            RenderEvent::OnBeforeParseHead,
            RenderEvent::OnAfterRender,
        ]
    );
    assert!(!recorder.events().contains(&RenderEvent::OnBeforeRenderView));
}

#[test]
fn tag_free_document_uses_no_parse_cycles() {
    let no_cycles = RenderConfig {
        max_iterations: 0,
        ..RenderConfig::default()
    };

    let engine = TemplateEngine::from_raw([("theme/default.tera", "<p>static</p>")]).expect("engine");
    let mut renderer = Renderer::without_events(resources(&[]), engine).with_config(no_cycles.clone());
    assert_eq!(
        renderer.render(&theme(), RuntimeContext::default()).expect("render"),
        "<p>static</p>"
    );

    let engine = TemplateEngine::from_raw([
        ("theme/default.tera", "<include hello />"),
        ("template/hello/custom.tera", "hi"),
    ])
    .expect("engine");
    let mut renderer = Renderer::without_events(resources(&[(ViewScheme::Template, "hello")]), engine)
        .with_config(no_cycles);
    let err = renderer.render(&theme(), RuntimeContext::default()).unwrap_err();
    assert!(matches!(err, RenderError::LoopLimitExceeded { limit: 0 }), "got: {err}");
}

#[test]
fn nested_includes_are_expanded_over_several_cycles() {
    let out = render(
        &[(ViewScheme::Page, "home"), (ViewScheme::Template, "greeting")],
        &[
            ("theme/default.tera", "<body><include page=home /></body>"),
            ("page/home.tera", "<main><include greeting /></main>"),
            ("template/greeting/custom.tera", "hi"),
        ],
    )
    .expect("render");
    assert_eq!(out, "<body><main>hi</main></body>");
}

/// Appends a per-render counter to every view output.
#[derive(Default)]
struct Counter {
    renders: usize,
}

impl EventDispatcher for Counter {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        if event != RenderEvent::OnAfterRenderView {
            return EventOutcome::unchanged();
        }
        self.renders += 1;
        EventOutcome {
            rendered_view: options.rendered_view.map(|v| format!("{v}{}", self.renders)),
            ..Default::default()
        }
    }
}

#[test]
fn identical_tags_share_one_render() {
    let (out, counter) = render_with(
        &[(ViewScheme::Template, "hello")],
        &[
            ("theme/default.tera", "[<include hello />|<include hello />]"),
            ("template/hello/custom.tera", "hi"),
        ],
        RuntimeContext::default(),
        Counter::default(),
    );
    assert_eq!(out.expect("render"), "[hi1|hi1]");
    assert_eq!(counter.renders, 1);
}

#[test]
fn token_attributes_reach_the_view() {
    let out = render(
        &[(ViewScheme::Template, "greet")],
        &[
            ("theme/default.tera", "<include greet who=world />"),
            ("template/greet/custom.tera", "hello {{ parameters.who }}"),
        ],
    )
    .expect("render");
    assert_eq!(out, "hello world");
}

#[test]
fn unnamed_page_token_uses_route_page() {
    let mut runtime = RuntimeContext::default();
    runtime.route.page = "home".into();
    let (out, _) = render_with(
        &[(ViewScheme::Page, "home")],
        &[
            ("theme/default.tera", "<include type=page />"),
            ("page/home.tera", "home page"),
        ],
        runtime,
        Recorder::default(),
    );
    assert_eq!(out.expect("render"), "home page");
}

// ---------------------------------------------------------------------------
// 2. Templates and wraps
// ---------------------------------------------------------------------------

#[test]
fn template_rows_fire_view_events_in_order() {
    let views = [(ViewScheme::Template, "list")];
    let templates = [
        ("theme/default.tera", "<include list />"),
        ("template/list/header.tera", "<ul>"),
        ("template/list/body.tera", "<li>{{ row.title }}</li>"),
        ("template/list/footer.tera", "</ul>"),
    ];
    let mut resources = resources(&views);
    resources.insert(
        ViewExtension::new(ViewScheme::Template, "list", "template/list")
            .with_parameter("model_name", "primary"),
    );
    let engine = TemplateEngine::from_raw(templates).expect("engine");
    let mut renderer = Renderer::new(resources, engine, Recorder::default());

    let out = renderer.render(&theme(), primary_rows(3)).expect("render");
    assert_eq!(out, "<ul><li>t1</li><li>t2</li><li>t3</li></ul>");
    assert_eq!(
        renderer.events().events(),
        vec![
            RenderEvent::OnBeforeParse,
            RenderEvent::OnBeforeRenderView,
            RenderEvent::OnBeforeRenderViewHead,
            RenderEvent::OnBeforeRenderViewItem,
            RenderEvent::OnBeforeRenderViewItem,
            RenderEvent::OnBeforeRenderViewItem,
            RenderEvent::OnBeforeRenderViewFooter,
            RenderEvent::OnAfterRenderView,
            RenderEvent::OnBeforeParseHead,
            RenderEvent::OnAfterRender,
        ]
    );
}

#[test]
fn token_wrap_surrounds_view_output() {
    let out = render(
        &[(ViewScheme::Template, "hello")],
        &[
            ("theme/default.tera", "<include hello wrap=div />"),
            ("template/hello/custom.tera", "hi"),
        ],
    )
    .expect("render");
    assert_eq!(out, "<div class=\"wrap-div\">hi</div>");
}

#[test]
fn default_wrap_uses_route_wrap() {
    let mut runtime = RuntimeContext::default();
    runtime.route.wrap = "section".into();
    let (out, _) = render_with(
        &[(ViewScheme::Template, "hello")],
        &[
            ("theme/default.tera", "<include hello wrap=default />"),
            ("template/hello/custom.tera", "hi"),
        ],
        runtime,
        Recorder::default(),
    );
    assert_eq!(out.expect("render"), "<section>hi</section>");
}

#[test]
fn direct_wrap_token_renders_empty_shell() {
    let out = render(&[], &[("theme/default.tera", "<include type=wrap name=div />")])
        .expect("render");
    assert_eq!(out, "<div class=\"wrap-div\"></div>");
}

// ---------------------------------------------------------------------------
// 3. Head pass
// ---------------------------------------------------------------------------

#[test]
fn head_tokens_are_deferred_until_the_head_pass() {
    let (out, recorder) = render_with(
        &[(ViewScheme::Template, "title"), (ViewScheme::Template, "main")],
        &[
            (
                "theme/default.tera",
                "<head><include type=head name=title /></head><include main />",
            ),
            ("template/title/custom.tera", "<title>T</title>"),
            ("template/main/custom.tera", "body"),
        ],
        RuntimeContext::default(),
        Recorder::default(),
    );
    assert_eq!(out.expect("render"), "<head><title>T</title></head>body");

    let before_head = recorder.page_at(RenderEvent::OnBeforeParseHead);
    assert!(before_head.contains("<include type=head name=title />"));
    assert!(!before_head.contains("<include main />"));
}

#[test]
fn custom_head_tokens_from_config() {
    let engine = TemplateEngine::from_raw([
        ("theme/default.tera", "<include late /><include early />"),
        ("template/late/custom.tera", "L"),
        ("template/early/custom.tera", "E"),
    ])
    .expect("engine");
    let views = [(ViewScheme::Template, "late"), (ViewScheme::Template, "early")];
    let mut renderer = Renderer::new(resources(&views), engine, Recorder::default()).with_config(
        RenderConfig {
            head_tokens: vec![" LATE ".into()],
            ..RenderConfig::default()
        },
    );
    let out = renderer.render(&theme(), RuntimeContext::default()).expect("render");
    assert_eq!(out, "LE");
    let before_head = renderer.events().page_at(RenderEvent::OnBeforeParseHead).to_string();
    assert_eq!(before_head, "<include late />E");
}

// ---------------------------------------------------------------------------
// 4. Events mutate state
// ---------------------------------------------------------------------------

struct Finaliser;

impl EventDispatcher for Finaliser {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        match event {
            RenderEvent::OnAfterRenderView => EventOutcome {
                rendered_view: options.rendered_view.map(str::to_uppercase),
                ..Default::default()
            },
            RenderEvent::OnAfterRender => EventOutcome {
                rendered_page: options.rendered_page.map(|p| format!("{p}<!-- done -->")),
                ..Default::default()
            },
            _ => EventOutcome::unchanged(),
        }
    }
}

#[test]
fn event_outcomes_rewrite_view_and_page() {
    let (out, _) = render_with(
        &[(ViewScheme::Template, "hello")],
        &[
            ("theme/default.tera", "<p><include hello /></p>"),
            ("template/hello/custom.tera", "hi"),
        ],
        RuntimeContext::default(),
        Finaliser,
    );
    assert_eq!(out.expect("render"), "<p>HI</p><!-- done -->");
}

// ---------------------------------------------------------------------------
// 5. Failures
// ---------------------------------------------------------------------------

#[test]
fn self_including_view_hits_loop_limit() {
    let engine = TemplateEngine::from_raw([
        ("theme/default.tera", "<include echo />"),
        ("template/echo/custom.tera", "again <include echo />"),
    ])
    .expect("engine");
    let mut renderer = Renderer::without_events(resources(&[(ViewScheme::Template, "echo")]), engine)
        .with_config(RenderConfig {
            max_iterations: 5,
            ..RenderConfig::default()
        });
    let err = renderer.render(&theme(), RuntimeContext::default()).unwrap_err();
    assert!(matches!(err, RenderError::LoopLimitExceeded { limit: 5 }), "got: {err}");
}

#[test]
fn unresolvable_token_fails_with_reference() {
    let (result, recorder) = render_with(
        &[(ViewScheme::Template, "known")],
        &[
            ("theme/default.tera", "<include known /><include missing />"),
            ("template/known/custom.tera", "k"),
        ],
        RuntimeContext::default(),
        Recorder::default(),
    );
    match result.unwrap_err() {
        RenderError::Resolution { reference } => {
            assert_eq!(reference, "Template:///App//View//Template//Missing");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Only `known` got as far as rendering; the page-level passes never finished.
    let events = recorder.events();
    let count = |event: RenderEvent| events.iter().filter(|e| **e == event).count();
    assert_eq!(count(RenderEvent::OnBeforeRenderView), 1);
    assert_eq!(count(RenderEvent::OnAfterRenderView), 1);
    assert_eq!(count(RenderEvent::OnBeforeParseHead), 0);
    assert_eq!(count(RenderEvent::OnAfterRender), 0);
}

#[test]
fn template_with_mistyped_include_path_is_not_found() {
    let mut resources = resources(&[]);
    resources.insert(ViewExtension::new(ViewScheme::Template, "menu", "template/menus"));
    let engine = TemplateEngine::from_raw([
        ("theme/default.tera", "x<include menu />y"),
        ("template/menu/custom.tera", "never"),
    ])
    .expect("engine");
    let mut renderer = Renderer::without_events(resources, engine);
    let err = renderer.render(&theme(), RuntimeContext::default()).unwrap_err();
    match err {
        RenderError::NotFound { path } => assert_eq!(path, std::path::PathBuf::from("template/menus")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_runtime_data_is_configuration_error() {
    let mut resources = resources(&[]);
    resources.insert(
        ViewExtension::new(ViewScheme::Template, "menu", "template/menu")
            .with_parameter("model_name", "menu")
            .with_parameter("model_type", "runtime_data"),
    );
    let engine = TemplateEngine::from_raw([
        ("theme/default.tera", "<include menu />"),
        ("template/menu/body.tera", "{{ row.label }}"),
    ])
    .expect("engine");
    let mut renderer = Renderer::without_events(resources, engine);
    let err = renderer.render(&theme(), RuntimeContext::default()).unwrap_err();
    assert!(matches!(err, RenderError::Configuration(_)), "got: {err}");
}

// ---------------------------------------------------------------------------
// 6. Site on disk
// ---------------------------------------------------------------------------

#[test]
fn renders_site_tree_from_disk() {
    let site = TempDir::new().expect("tempdir");
    let write = |rel: &str, body: &str| {
        let path = site.path().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, body).expect("write");
    };
    write(
        "weave.yaml",
        "views:\n  - scheme: template\n    name: articles\n    parameters: { model_name: primary }\n",
    );
    write(
        "views/theme/default.tera",
        "<html><head><include type=head name=title /></head><body><include articles wrap=div /></body></html>",
    );
    write("views/template/title/custom.tera", "<title>Site</title>");
    write("views/template/articles/header.tera", "<ul>");
    write("views/template/articles/body.tera", "<li>{{ row.title }}</li>");
    write("views/template/articles/footer.tera", "</ul>");

    let manifest = config::load_manifest_at(site.path()).expect("manifest");
    let resources = ResourceMap::for_site(site.path(), &manifest).expect("resources");
    let engine = TemplateEngine::new(Some(&config::views_dir_at(site.path()))).expect("engine");
    let mut renderer = Renderer::without_events(resources, engine).with_config(manifest.render);

    let out = renderer.render_route(primary_rows(2)).expect("render");
    assert_eq!(
        out,
        "<html><head><title>Site</title></head><body><div class=\"wrap-div\"><ul><li>t1</li><li>t2</li></ul></div></body></html>"
    );
}
