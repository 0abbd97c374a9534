//! Markdown-ish to HTML conversion for assistant text and the final plan.
//!
//! Angle brackets are escaped before any tag is produced, so nothing in the
//! input can reach the output as markup.

use once_cell::sync::Lazy;
use regex::Regex;
use shared::domain::{Message, Sender};

static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid regex"));
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid regex"));
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static STAR_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\* (.*)$").expect("valid regex"));
static DASH_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^- (.*)$").expect("valid regex"));
static ITEM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^((?:<li>.*?</li>)+)$").expect("valid regex"));

/// Which surface the HTML is for; only the class attributes differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    #[default]
    Chat,
    Summary,
}

struct Classes {
    h1: &'static str,
    h2: &'static str,
    h3: &'static str,
    strong: &'static str,
    li: &'static str,
}

impl RenderStyle {
    fn classes(self) -> Classes {
        match self {
            Self::Chat => Classes {
                h1: "text-2xl font-bold text-gray-900 mt-8 mb-4",
                h2: "text-xl font-bold text-gray-800 mt-6 mb-3 border-b pb-2",
                h3: "text-lg font-semibold text-gray-800 mt-4 mb-2",
                strong: "font-medium",
                li: "list-disc ml-5",
            },
            Self::Summary => Classes {
                h1: "text-3xl font-bold text-gray-800 mb-2",
                h2: "text-xl font-semibold text-indigo-600 mt-6 mb-3 border-b-2 border-indigo-200 pb-2",
                h3: "text-lg font-semibold text-gray-800 mt-4 mb-2",
                strong: "font-semibold text-gray-800",
                li: "list-disc ml-6 mb-2 text-gray-700",
            },
        }
    }
}

pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

pub fn render_html(text: &str, style: RenderStyle) -> String {
    let classes = style.classes();
    let html = escape_angle_brackets(&text.replace("\r\n", "\n"));

    let h3 = format!(r#"<h3 class="{}">${{1}}</h3>"#, classes.h3);
    let h2 = format!(r#"<h2 class="{}">${{1}}</h2>"#, classes.h2);
    let h1 = format!(r#"<h1 class="{}">${{1}}</h1>"#, classes.h1);
    let strong = format!(r#"<strong class="{}">${{1}}</strong>"#, classes.strong);

    let html = H3.replace_all(&html, h3.as_str());
    let html = H2.replace_all(&html, h2.as_str());
    let html = H1.replace_all(&html, h1.as_str());
    let html = BOLD.replace_all(&html, strong.as_str());
    let html = STAR_ITEM.replace_all(&html, "<li>${1}</li>");
    let html = DASH_ITEM.replace_all(&html, "<li>${1}</li>");
    let html = html.replace("</li>\n<li>", "</li><li>");
    let html = ITEM_RUN.replace_all(&html, "<ul>${1}</ul>");
    let html = html.replace("<li>", &format!(r#"<li class="{}">"#, classes.li));

    html.replace('\n', "<br />")
}

/// One chat bubble per message, assistant text rendered as markdown.
pub fn render_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| match message.sender {
            Sender::Assistant => format!(
                "<div class=\"message assistant\">{}</div>",
                render_html(&message.text, RenderStyle::Chat)
            ),
            Sender::User => format!(
                "<div class=\"message user\">{}</div>",
                escape_angle_brackets(&message.text).replace('\n', "<br />")
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Standalone HTML page with the final plan followed by the conversation that produced it.
pub fn render_page(title: &str, document: &str, conversation: &[Message]) -> String {
    let title = escape_angle_brackets(title);
    let summary = render_html(document, RenderStyle::Summary);
    let chat = render_conversation(conversation);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<div class=\"prose max-w-none\">{summary}</div>\n<section class=\"conversation\">\n{chat}\n</section>\n</body>\n</html>\n"
    )
}
