use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use std::fs;
use std::path::PathBuf;

use crate::error::AppError;
use crate::user::{User, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};

const LAYOUT: &str = "layout.html";

/// Everything a page template can refer to.
pub struct Page<'a> {
    pub template: &'a str,
    pub title: &'a str,
    pub user: Option<&'a User>,
    pub flashes: Vec<String>,
    pub next: Option<&'a str>,
}

impl<'a> Page<'a> {
    pub fn new(template: &'a str, title: &'a str) -> Self {
        Page {
            template,
            title,
            user: None,
            flashes: Vec::new(),
            next: None,
        }
    }

    pub fn user(mut self, user: Option<&'a User>) -> Self {
        self.user = user;
        self
    }

    pub fn flashes(mut self, flashes: Vec<String>) -> Self {
        self.flashes = flashes;
        self
    }

    pub fn next(mut self, next: Option<&'a str>) -> Self {
        self.next = next;
        self
    }
}

#[derive(Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Templates { dir: dir.into() }
    }

    fn load(&self, name: &str) -> Result<String, AppError> {
        fs::read_to_string(self.dir.join(name)).map_err(|source| AppError::Template {
            name: name.to_string(),
            source,
        })
    }

    pub fn render(&self, page: &Page) -> Result<String, AppError> {
        let layout = self.load(LAYOUT)?;
        let content = self.load(page.template)?;
        let html = layout.replace("{{content}}", &content);

        // One pass over the template, so substituted text is never scanned again.
        Ok(fill(&html, |name| match name {
            "title" => Some(escape(page.title)),
            "nav" => Some(nav(page.user)),
            "flashes" => Some(flash_list(&page.flashes)),
            "max_username" => Some(MAX_USERNAME_LEN.to_string()),
            "max_password" => Some(MAX_PASSWORD_LEN.to_string()),
            "username" => Some(escape(
                page.user.map(|u| u.username.as_str()).unwrap_or("friend"),
            )),
            "next" => Some(escape(page.next.unwrap_or(""))),
            _ => None,
        }))
    }

    pub fn respond(&self, page: &Page) -> Result<HttpResponse, AppError> {
        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(self.render(page)?))
    }
}

/// Replace every `{{name}}` the lookup knows; unknown names are left as they are.
fn fill<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = match after.find("}}") {
            Some(end) => end,
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        };
        let name = &after[..end];
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn nav(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            r#"<span class="who">Signed in as {}</span> <a href="/logout">Log out</a>"#,
            escape(&user.username)
        ),
        None => r#"<a href="/log_in">Log in</a> <a href="/sign_up">Sign up</a>"#.to_string(),
    }
}

fn flash_list(flashes: &[String]) -> String {
    if flashes.is_empty() {
        return String::new();
    }
    let items: String = flashes
        .iter()
        .map(|msg| format!("<li>{}</li>", escape(msg)))
        .collect();
    format!(r#"<ul class="flashes">{}</ul>"#, items)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
pub fn test_templates() -> Templates {
    Templates::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}
