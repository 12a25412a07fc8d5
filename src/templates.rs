use anyhow::Context as _;
use axum::response::Html;
use tera::{Context, Tera};

use crate::error::AppError;

/// Compiles the embedded page templates. `.html` templates are autoescaped.
pub fn load() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("index.html", include_str!("../templates/index.html")),
        ("register.html", include_str!("../templates/register.html")),
        ("login.html", include_str!("../templates/login.html")),
        ("dashboard.html", include_str!("../templates/dashboard.html")),
    ])
    .context("compile templates")?;
    Ok(tera)
}

pub fn render(tera: &Tera, name: &str, ctx: &Context) -> Result<Html<String>, AppError> {
    tera.render(name, ctx)
        .map(Html)
        .with_context(|| format!("render {name}"))
        .map_err(AppError::Internal)
}
