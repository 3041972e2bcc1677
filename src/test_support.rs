use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::App;
use scraper::{Html, Selector};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::SESSION_COOKIE;

pub fn test_config() -> Config {
    Config::from_lookup(|name| match name {
        "SECRET_KEY" => Some("not so secret".to_string()),
        "TEMPLATE_DIR" => Some(concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string()),
        "STATIC_DIR" => Some(concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_app(
    pool: SqlitePool,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    crate::app(pool, &test_config())
}

pub fn form_post(
    uri: &str,
    form: &[(&str, &str)],
    cookie: Option<&Cookie<'static>>,
) -> TestRequest {
    let req = TestRequest::post().uri(uri).set_form(form);
    match cookie {
        Some(cookie) => req.cookie(cookie.clone()),
        None => req,
    }
}

pub fn get(uri: &str, cookie: Option<&Cookie<'static>>) -> TestRequest {
    let req = TestRequest::get().uri(uri);
    match cookie {
        Some(cookie) => req.cookie(cookie.clone()),
        None => req,
    }
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

/// The session cookie after `resp`: the updated one if it set one, else `prev`.
pub fn carry_cookie<B>(resp: &ServiceResponse<B>, prev: Cookie<'static>) -> Cookie<'static> {
    session_cookie(resp).unwrap_or(prev)
}

pub fn location_of<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn flashes(body: &[u8]) -> Vec<String> {
    let doc = Html::parse_document(&String::from_utf8_lossy(body));
    let selector = Selector::parse("ul.flashes li").unwrap();
    doc.select(&selector).map(|li| li.text().collect()).collect()
}

pub fn page_title(body: &[u8]) -> String {
    let doc = Html::parse_document(&String::from_utf8_lossy(body));
    let selector = Selector::parse("title").unwrap();
    doc.select(&selector)
        .next()
        .map(|t| t.text().collect())
        .unwrap_or_default()
}

pub fn signed_in_as(body: &[u8]) -> Option<String> {
    let doc = Html::parse_document(&String::from_utf8_lossy(body));
    let selector = Selector::parse(".account .who").unwrap();
    doc.select(&selector)
        .next()
        .map(|e| e.text().collect::<String>())
        .and_then(|text| text.strip_prefix("Signed in as ").map(str::to_string))
}
