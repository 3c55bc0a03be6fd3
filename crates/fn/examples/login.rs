use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response};
use http_body_util::Full;
use micro_fn::extract::{Form, Json, Param};
use micro_fn::{plugin_fn, Container, Context, FnRequest, RequestHandler, ResponseBody, StatusError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Debug)]
struct LoginRequest {
    name: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

#[derive(Clone, Debug)]
struct Session {
    user: String,
}

impl Param for Session {}

#[derive(Debug)]
struct TraceId(String);

async fn login(ctx: Context, Json(req): Json<LoginRequest>) -> Result<LoginResponse, StatusError> {
    info!(trace_id = ?ctx.get::<TraceId>(), name = %req.name, "login");
    if req.password != "secret" {
        return Err(StatusError::unauthorized("wrong password"));
    }
    Ok(LoginResponse { token: format!("token-{}", req.name) })
}

async fn profile(session: Session, headers: HeaderMap) -> Result<serde_json::Value, StatusError> {
    Ok(json!({ "user": session.user, "agent": headers.get(http::header::USER_AGENT).and_then(|v| v.to_str().ok()) }))
}

async fn logout(_session: Session, _form: Form) -> Result<(), StatusError> {
    Ok(())
}

fn request(method: Method, uri: &str, token: Option<&str>, body: &'static str) -> Request<Full<Bytes>> {
    let mut builder = Request::builder().method(method).uri(uri).header(http::header::USER_AGENT, "curl/8.0");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, token);
    }
    builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()
}

fn print(name: &str, response: Response<ResponseBody>) {
    println!("{name}: {} {}", response.status(), String::from_utf8_lossy(response.body().as_bytes()));
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut container = Container::new();
    container
        .plugin(plugin_fn(|ctx: Context, req: &FnRequest| {
            let trace_id = req.headers().get("x-trace-id").and_then(|v| v.to_str().ok()).unwrap_or("generated");
            Ok::<_, StatusError>(ctx.with_value(TraceId(trace_id.to_string())))
        }))
        .request_plugin(|_ctx: &Context, req: &FnRequest| {
            req.headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("token-"))
                .map(|user| Session { user: user.to_string() })
                .ok_or_else(|| StatusError::unauthorized("please login first"))
        })
        .set_response_encoder(|_ctx, payload| json!({ "code": 0, "data": payload }))
        .set_error_encoder(|_ctx, err| json!({ "code": -1, "message": err.to_string() }));

    let login = container.wrap(login).unwrap();
    let profile = container.wrap(profile).unwrap();
    let logout = container.wrap(logout).unwrap();

    print("login", login.invoke(request(Method::POST, "/login", None, r#"{"name":"zava","password":"secret"}"#)).await);
    print("bad login", login.invoke(request(Method::POST, "/login", None, r#"{"name":"zava","password":"guess"}"#)).await);
    print("profile", profile.invoke(request(Method::GET, "/profile", Some("token-zava"), "")).await);
    print("anonymous profile", profile.invoke(request(Method::GET, "/profile", None, "")).await);
    print("logout", logout.invoke(request(Method::POST, "/logout", Some("token-zava"), "")).await);
}
