//! Integration tests for dispatch, route events and request handling

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use uno_core::*;

fn recorder(app: &Application) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for event in [ROUTE_BEFORE, ROUTE_AFTER] {
        let log = log.clone();
        app.on(event, move |args| {
            let route = args.get::<Arc<Route>>(0).expect("route argument");
            let path = args.get::<String>(1).expect("path argument");
            log.lock().push(format!("{} {} {}", args.event(), route.path(), path));
            Ok(())
        });
    }
    log
}

#[test]
fn test_run_emits_before_and_after_in_order() {
    let app = Application::new();
    let log = recorder(&app);
    let handler_log = log.clone();
    app.route("hello", &[], move |_, _| {
        handler_log.lock().push("handler".to_string());
        Ok(Response::text("hi"))
    });

    let response = app.run("/hello/").unwrap();
    assert_eq!(response.body, "hi");
    assert_eq!(
        *log.lock(),
        vec![
            "route.before /hello /hello".to_string(),
            "handler".to_string(),
            "route.after /hello /hello".to_string(),
        ]
    );
}

#[test]
fn test_unknown_route_emits_nothing() {
    let app = Application::new();
    let log = recorder(&app);
    assert!(matches!(
        app.run("missing"),
        Err(Error::RouteNotFound(ref p)) if p == "/missing"
    ));
    assert!(log.lock().is_empty());
}

#[test]
fn test_failing_handler_skips_after_event() {
    let app = Application::new();
    let log = recorder(&app);
    app.route("fail", &[], |_, _| Err(Error::handler("nope")));

    assert!(app.run("fail").is_err());
    assert_eq!(*log.lock(), vec!["route.before /fail /fail".to_string()]);
}

#[test]
fn test_failing_before_listener_aborts_run() {
    let app = Application::new();
    let ran = Arc::new(Mutex::new(false));
    let flag = ran.clone();
    app.on(ROUTE_BEFORE, |_| Err(ListenerError::failed("denied")));
    app.route("guarded", &[], move |_, _| {
        *flag.lock() = true;
        Ok(Response::text("secret"))
    });

    assert!(matches!(app.run("guarded"), Err(Error::Event(_))));
    assert!(!*ran.lock());
}

#[test]
fn test_handler_dependencies_and_context() {
    let app = Application::new();
    app.instance("greeting", "hello".to_string());
    app.register("#shout", &["greeting"], |deps| {
        Ok(deps.get::<String>(0)?.to_uppercase())
    });
    app.route("greet", &["shout"], |app, deps| {
        let name = app.query()?.get_or("name", "world").to_string();
        Ok(Response::text(format!("{} {}", deps.get::<String>(0)?, name)))
    });

    let response = app.handle(Request::get("/greet?name=ann").unwrap());
    assert_eq!(response.body, "HELLO ann");
}

#[test]
fn test_replacing_the_router_capability() {
    let app = Application::new();
    app.route("fallback", &[], |_, _| Ok(Response::text("fallback")));
    app.register("router", &[], |_| {
        Ok(Dispatcher::new(|table, path| {
            table.get(path).or_else(|| table.get("/fallback"))
        }))
    });

    assert_eq!(app.run("/whatever").unwrap().body, "fallback");
}

#[test]
fn test_handle_reports_errors_through_handler() {
    let app = Application::new();
    let response = app.handle(Request::get("/nowhere").unwrap());
    assert_eq!(response.status_code(), 404);
    assert!(response.body.contains("RouteNotFound"));

    app.route("form", &[], |app, _| {
        let form = app.form()?;
        Ok(Response::text(form.require("email")?))
    });
    let response = app.handle(Request::post("/form", "name=x").unwrap());
    assert_eq!(response.status_code(), 400);
}

#[test]
fn test_custom_error_handler() {
    let app = Application::new().with_error_handler(|err: &Error| {
        Response::json(&json!({"error": err.kind()}))
            .unwrap_or_else(|_| Response::text("error"))
            .with_status(err.status())
    });

    let response = app.handle(Request::get("/missing").unwrap());
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.body, r#"{"error":"RouteNotFound"}"#);
    assert!(app.resolve::<ErrorHandlerRef>("onerror").is_ok());
}

#[test]
fn test_cookies_and_session() {
    let app = Application::new();
    app.route("login", &["cookie", "session"], |_, deps| {
        deps.get::<Cookies>(0)?.set("user", "ann smith");
        deps.get::<Session>(1)?.set("user_id", 7)?;
        Ok(Response::text("ok"))
    });

    let session = Session::new();
    let request = Request::post("/login", "")
        .unwrap()
        .with_session(session.clone())
        .with_cookies(Cookies::parse_header("theme=dark"));
    let response = app.handle(request);

    assert_eq!(response.headers["set-cookie"], "user=ann+smith; Path=/");
    assert_eq!(session.get("user_id"), Some(json!(7)));
}

#[test]
fn test_concurrent_requests_see_their_own_input() {
    let app = Application::new();
    let barrier = Arc::new(Barrier::new(2));
    let gate = barrier.clone();
    app.route("echo", &[], move |app, _| {
        // Both requests are in flight before either reads its input.
        gate.wait();
        let id = app.query()?.get_or("id", "none").to_string();
        app.cookies()?.set("seen", &id);
        Ok(Response::text(id))
    });

    let (a, b) = thread::scope(|s| {
        let a = s.spawn(|| app.handle(Request::get("/echo?id=A").unwrap()));
        let b = s.spawn(|| app.handle(Request::get("/echo?id=B").unwrap()));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(a.body, "A");
    assert_eq!(b.body, "B");
    assert_eq!(a.headers["set-cookie"], "seen=A; Path=/");
    assert_eq!(b.headers["set-cookie"], "seen=B; Path=/");

    // Outside of `handle` the request is empty again.
    assert_eq!(app.query().unwrap().get("id"), None);
}

#[test]
fn test_method_helpers() {
    let app = Application::new();
    app.route("submit", &[], |app, _| {
        let post = app.invoke("isPost", &[])?;
        let raw = app.raw_body()?.as_str().to_string();
        Ok(Response::text(format!("{post} {raw}")))
    });

    let response = app.handle(Request::post("/submit", "a=1").unwrap());
    assert_eq!(response.body, "true a=1");
}

#[test]
fn test_invoke_reports_a_broken_helper_factory() {
    let app = Application::new();
    app.register("limit", &[], |_| Ok(10u8));
    app.register("helper", &["limit"], |deps| {
        let max = deps.get::<u8>(1)?;
        Ok(Callable::new(move |_| Ok(json!(*max))))
    });

    assert!(matches!(
        app.invoke("helper", &[]),
        Err(Error::MissingArgument(ref a)) if a == "#1"
    ));
    assert!(matches!(app.invoke("absent", &[]), Err(Error::NoSuchMethod(_))));
}

#[test]
fn test_redirect_and_json_helpers() {
    let app = Application::new();
    app.route("old", &[], |app, _| app.redirect("/new"));
    app.route("data", &[], |app, _| app.json(&json!({"ok": true})));

    let response = app.run("old").unwrap();
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.headers["location"], "/new");
    assert_eq!(app.run("data").unwrap().body, r#"{"ok":true}"#);
    assert!(app.log("served data").is_ok());
}

#[test]
fn test_views_render_from_configured_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("home.hbs"), "<h1>{{title}}</h1>").unwrap();
    let app = Application::with_config(AppConfig::new().with_view_dir(dir.path()));
    app.route("", &[], |app, _| app.render("home.hbs", &[json!({"title": "Home"})]));

    let response = app.handle(Request::get("/").unwrap());
    assert_eq!(response.body, "<h1>Home</h1>");
    assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Signup {
    user_name: String,
    age: u32,
}

impl Model for Signup {}

#[test]
fn test_loader_capability() {
    let app = Application::new();
    let signup: Signup = app
        .loader()
        .unwrap()
        .load(&[json!({"user_name": "ann", "age": 30, "admin": true})])
        .unwrap();
    assert_eq!(signup.user_name, "ann");
    assert_eq!(signup.age, 30);
}
