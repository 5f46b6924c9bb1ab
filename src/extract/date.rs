// src/extract/date.rs

use tracing::{info, warn};

use super::resolver::{resolve, Resolution};
use crate::{
    dom::{ContentContext, ContentSource},
    schema::ExtractedDate,
};

/// Text the composition heading starts with, e.g. `Carteira do Dia - 17/07/25`.
pub const HEADING_MARKER: &str = "Carteira do Dia";

const HEADING_SEPARATOR: char = '-';

/// Where the date heading has been seen, most specific first.
const HEADING_SELECTORS: &[&str] = &[
    "#divContainerIframeB3 form h2",
    "form h2",
    "h2",
    "h1, h3",
    "[class*='title'], [class*='titulo']",
];

/// Parse a heading like `Carteira do Dia - 17/07/25` into `17-07-25`.
///
/// Requires the marker and the separator; takes the text after the last
/// separator. `None` when either is missing or nothing follows.
pub fn parse_heading(text: &str) -> Option<ExtractedDate> {
    let text = text.trim();
    if !text.contains(HEADING_MARKER) {
        return None;
    }
    let (_, tail) = text.rsplit_once(HEADING_SEPARATOR)?;
    ExtractedDate::new(tail.trim().replace('/', "-"))
}

/// Read the composition date from the first visible heading that parses,
/// defaulting to today.
pub async fn extract_date(source: &dyn ContentSource, ctx: ContentContext) -> ExtractedDate {
    let res = resolve(HEADING_SELECTORS, |sel| async move {
        let found = source
            .elements(ctx, sel)
            .await?
            .into_iter()
            .filter(|el| el.visible)
            .find_map(|el| parse_heading(&el.text));
        Ok(found)
    })
    .await;

    match res {
        Resolution::Found {
            strategy, value, ..
        } => {
            info!(date = %value, selector = %strategy, "extracted composition date");
            value
        }
        Resolution::NotFound => {
            let today = ExtractedDate::today();
            warn!(date = %today, "no date heading found, using current date");
            today
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlSnapshot;

    #[test]
    fn test_parse_heading() {
        let date = parse_heading("Carteira do Dia - 17/07/25").unwrap();
        assert_eq!(date.as_str(), "17-07-25");
    }

    #[test]
    fn test_parse_heading_uses_last_separator() {
        let date = parse_heading("  IBOV - Carteira do Dia - 02/01/24 \n").unwrap();
        assert_eq!(date.as_str(), "02-01-24");
    }

    #[test]
    fn test_parse_heading_rejects_missing_parts() {
        assert!(parse_heading("Carteira Teórica").is_none());
        assert!(parse_heading("Carteira do Dia 17/07/25").is_none());
        assert!(parse_heading("Índice - 17/07/25").is_none());
        assert!(parse_heading("Carteira do Dia - ").is_none());
    }

    #[tokio::test]
    async fn test_extract_from_form_heading() {
        let snap = HtmlSnapshot::parse(
            r#"<body><div id="divContainerIframeB3"><form>
                <h2>Carteira do Dia - 17/07/25</h2>
            </form></div></body>"#,
        );
        let date = extract_date(&snap, ContentContext::MainDocument).await;
        assert_eq!(date.as_str(), "17-07-25");
    }

    #[tokio::test]
    async fn test_hidden_heading_is_ignored() {
        let snap = HtmlSnapshot::parse(
            r#"<body>
                <h2 style="display:none">Carteira do Dia - 01/01/20</h2>
                <h1>Carteira do Dia - 18/07/25</h1>
            </body>"#,
        );
        let date = extract_date(&snap, ContentContext::MainDocument).await;
        assert_eq!(date.as_str(), "18-07-25");
    }

    #[tokio::test]
    async fn test_unparseable_heading_defaults_to_today() {
        let snap = HtmlSnapshot::parse("<body><h2>Composição do índice</h2></body>");
        let date = extract_date(&snap, ContentContext::MainDocument).await;
        assert_eq!(date, ExtractedDate::today());
    }

    #[tokio::test]
    async fn test_unreachable_context_defaults_to_today() {
        let snap = HtmlSnapshot::parse("<body><h2>Carteira do Dia - 17/07/25</h2></body>");
        let date = extract_date(&snap, ContentContext::Iframe(3)).await;
        assert_eq!(date, ExtractedDate::today());
    }
}
