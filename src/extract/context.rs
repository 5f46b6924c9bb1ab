// src/extract/context.rs

use anyhow::Result;
use tracing::{debug, info, warn};

use super::resolver::{first_present, Resolution};
use crate::dom::{ContentContext, ContentSource};

/// Elements whose presence means an iframe holds the real page content.
const CONTENT_MARKERS: &[&str] = &["h1, h2, h3, h4, h5, h6", "form"];

/// Decide once per run whether queries go to the main document or to the
/// first iframe. Any failure while probing falls back to the main document.
pub async fn locate_content_context(source: &dyn ContentSource) -> ContentContext {
    match probe(source).await {
        Ok(ctx) => {
            info!(context = %ctx, "content context located");
            ctx
        }
        Err(e) => {
            warn!("probing for iframe content failed, using main document: {:#}", e);
            ContentContext::MainDocument
        }
    }
}

async fn probe(source: &dyn ContentSource) -> Result<ContentContext> {
    let iframes = source.count(ContentContext::MainDocument, "iframe").await?;
    if iframes == 0 {
        return Ok(ContentContext::MainDocument);
    }

    let frame = ContentContext::Iframe(0);
    match first_present(source, frame, CONTENT_MARKERS).await {
        Resolution::Found { strategy, .. } => {
            debug!(marker = %strategy, "iframe holds page content");
            Ok(frame)
        }
        Resolution::NotFound => {
            info!(iframes, "iframe present but holds no headings or forms");
            Ok(ContentContext::MainDocument)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlSnapshot;

    #[tokio::test]
    async fn test_no_iframe_uses_main_document() {
        let snap = HtmlSnapshot::parse("<body><h2>x</h2></body>");
        assert_eq!(
            locate_content_context(&snap).await,
            ContentContext::MainDocument
        );
    }

    #[tokio::test]
    async fn test_iframe_with_form_is_chosen() {
        let snap = HtmlSnapshot::parse(
            r#"<body><iframe srcdoc="<form><select id='segment'></select></form>"></iframe></body>"#,
        );
        assert_eq!(
            locate_content_context(&snap).await,
            ContentContext::Iframe(0)
        );
    }

    #[tokio::test]
    async fn test_iframe_with_heading_is_chosen() {
        let snap = HtmlSnapshot::parse(
            r#"<body><iframe srcdoc="<h2>Carteira do Dia - 17/07/25</h2>"></iframe></body>"#,
        );
        assert_eq!(
            locate_content_context(&snap).await,
            ContentContext::Iframe(0)
        );
    }

    #[tokio::test]
    async fn test_iframe_with_minor_heading_is_chosen() {
        let snap = HtmlSnapshot::parse(
            r#"<body><iframe srcdoc="<h6>Carteira do Dia - 17/07/25</h6>"></iframe></body>"#,
        );
        assert_eq!(
            locate_content_context(&snap).await,
            ContentContext::Iframe(0)
        );
    }

    #[tokio::test]
    async fn test_empty_iframe_falls_back() {
        let snap = HtmlSnapshot::parse(
            r#"<body><iframe srcdoc="<p>advert</p>"></iframe><iframe srcdoc="<form></form>"></iframe></body>"#,
        );
        assert_eq!(
            locate_content_context(&snap).await,
            ContentContext::MainDocument
        );
    }
}
