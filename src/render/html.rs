//! HTML fragments for embedding previews.
//!
//! Fragments are built from view models only, so every piece of text is
//! already [`SafeText`] and is escaped here at insertion.

use super::sanitize::{SafeText, escape_html};
use super::{
    AnalysisPanel, ImageView, InsightsPanel, JobRow, MetricsSection, PersonalizationPanel,
    SectionBody, SlideThumbnail, Swatch,
};

fn list(items: &[SafeText]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str(&format!("<li>{}</li>", item.to_html()));
    }
    out.push_str("</ul>");
    out
}

fn swatch(s: &Swatch) -> String {
    // `color` is validated hex, `label` is escaped.
    format!(
        r#"<span class="swatch" style="background:{}" title="{}"></span>"#,
        s.color,
        s.label.to_html()
    )
}

pub fn slide_grid(thumbs: &[SlideThumbnail]) -> String {
    let mut out = String::from(r#"<div class="slides">"#);
    for t in thumbs {
        out.push_str(&format!(
            r#"<div class="slide slide-{kind}" data-index="{idx}"><span class="num">{num}</span><h3>{title}</h3><span class="bullets">{bullets} points</span></div>"#,
            kind = t.slide_type,
            idx = t.index,
            num = t.index + 1,
            title = t.title.to_html(),
            bullets = t.bullet_count,
        ));
    }
    out.push_str("</div>");
    out
}

pub fn insights(panel: &InsightsPanel) -> String {
    let mut out = String::from(r#"<section class="insights"><h2>AI design insights</h2>"#);
    if let Some(q) = panel.quality_percent {
        out.push_str(&format!(r#"<p class="quality">Quality score: {q}%</p>"#));
    }
    if !panel.palette.is_empty() {
        out.push_str(r#"<div class="palette">"#);
        for s in &panel.palette {
            out.push_str(&swatch(s));
        }
        out.push_str("</div>");
    }
    if !panel.fonts.is_empty() {
        out.push_str("<h3>Typography</h3>");
        out.push_str(&list(&panel.fonts));
    }
    if !panel.principles.is_empty() {
        out.push_str("<h3>Design principles</h3>");
        out.push_str(&list(&panel.principles));
    }
    out.push_str("</section>");
    out
}

pub fn analysis(panel: &AnalysisPanel) -> String {
    format!(
        r#"<section class="analysis"><h2>Content analysis</h2><dl><dt>Type</dt><dd>{}</dd><dt>Complexity</dt><dd>{}</dd><dt>Words</dt><dd>{}</dd></dl>{}</section>"#,
        panel.content_type.to_html(),
        panel.complexity_level.to_html(),
        panel.word_count,
        list(&panel.main_themes),
    )
}

pub fn personalization(panel: &PersonalizationPanel) -> String {
    let mut out = format!(
        r#"<section class="personalization"><h2>Personalized for you</h2><p class="level">Level: {}</p><dl>"#,
        panel.level.to_html()
    );
    for (name, value) in &panel.recommendations {
        out.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>",
            escape_html(name),
            value.to_html()
        ));
    }
    out.push_str("</dl>");
    for s in &panel.palette {
        out.push_str(&swatch(s));
    }
    if !panel.confidence.is_empty() {
        out.push_str(r#"<ul class="confidence">"#);
        for (name, pct) in &panel.confidence {
            out.push_str(&format!("<li>{}: {pct}%</li>", name.to_html()));
        }
        out.push_str("</ul>");
    }
    if !panel.suggestions.is_empty() {
        out.push_str(&list(&panel.suggestions));
    }
    out.push_str("</section>");
    out
}

pub fn job_table(rows: &[JobRow]) -> String {
    if rows.is_empty() {
        return r#"<p class="empty">No batch jobs</p>"#.to_string();
    }
    let mut out = String::from(
        "<table class=\"jobs\"><tr><th>Job</th><th>Status</th><th>Progress</th><th>Tasks</th><th>Created</th></tr>",
    );
    for r in rows {
        out.push_str(&format!(
            r#"<tr class="status-{status}"><td>{id}</td><td>{status}</td><td><progress max="100" value="{pct}"></progress> {pct}%</td><td>{done}/{total} ({failed} failed)</td><td>{created}</td></tr>"#,
            status = escape_html(&r.status),
            id = r.job_id.to_html(),
            pct = r.progress_percent,
            done = r.completed_tasks,
            total = r.total_tasks,
            failed = r.failed_tasks,
            created = r.created_at.to_html(),
        ));
    }
    out.push_str("</table>");
    out
}

pub fn metrics(sections: &[MetricsSection]) -> String {
    let mut out = String::from(r#"<div class="metrics">"#);
    for s in sections {
        out.push_str(&format!("<section><h3>{}</h3>", escape_html(s.title)));
        match &s.body {
            SectionBody::Rows(rows) => {
                out.push_str("<dl>");
                for (k, v) in rows {
                    out.push_str(&format!(
                        "<dt>{}</dt><dd>{}</dd>",
                        escape_html(k),
                        escape_html(v)
                    ));
                }
                out.push_str("</dl>");
            }
            SectionBody::LoadFailed => {
                out.push_str(r#"<p class="error">Failed to load</p>"#);
            }
        }
        out.push_str("</section>");
    }
    out.push_str("</div>");
    out
}

pub fn image(view: &ImageView) -> String {
    let img = match &view.data_url {
        Some(url) => format!(r#"<img src="{url}" alt="{}">"#, view.caption.to_html()),
        None => r#"<p class="error">No image data</p>"#.to_string(),
    };
    let mut out = format!(
        r#"<figure>{img}<figcaption>{}</figcaption></figure>"#,
        view.caption.to_html()
    );
    if !view.suggestions.is_empty() {
        out.push_str(&list(&view.suggestions));
    }
    out
}

/// Wrap fragments into a standalone page.
pub fn page(title: &str, fragments: &[String]) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\n{}\n</body></html>\n",
        escape_html(title),
        fragments.join("\n")
    )
}
