//! Gazette layout: a single-column resume with a centered header and ruled
//! section headings. Consumes the normalized resume only; never touches raw
//! form data.

use crate::templates::order::SectionOrder;
use crate::templates::standard::StandardResume;
use crate::templates::theme::{escape_html, ThemePalette};

/// Renders the resume as a self-contained HTML document. Sections render in
/// the given main order; a sidebar list is folded onto the end since this
/// layout has no sidebar area. Empty sections are skipped.
pub fn render(resume: &StandardResume, palette: &ThemePalette, order: &SectionOrder) -> String {
    let mut body = String::new();
    header(&mut body, resume);

    for id in order.main.iter().chain(order.sidebar.iter()) {
        section(&mut body, resume, id);
    }

    page(palette, &body)
}

fn page(palette: &ThemePalette, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body {{ font-family: Georgia, serif; color: {ink}; max-width: 46rem; margin: 2rem auto; line-height: 1.45; }}
header {{ text-align: center; margin-bottom: 1.5rem; }}
h1 {{ color: {accent}; margin: 0 0 0.25rem; font-size: 1.8rem; }}
.contact {{ color: {muted_ink}; font-size: 0.9rem; }}
h2 {{ color: {accent}; font-size: 1.05rem; text-transform: uppercase; letter-spacing: 0.08em; border-bottom: 2px solid {muted}; padding-bottom: 0.2rem; margin: 1.4rem 0 0.6rem; }}
.entry {{ margin-bottom: 0.7rem; }}
.entry-head {{ display: flex; justify-content: space-between; }}
.entry-head strong {{ font-size: 1rem; }}
.dates {{ color: {muted_ink}; font-size: 0.85rem; }}
.detail {{ margin: 0.15rem 0 0; }}
ul.skills {{ margin: 0; padding-left: 1.2rem; }}
</style>
</head>
<body>
{body}</body>
</html>
"#,
        ink = palette.ink,
        accent = palette.accent,
        muted = palette.muted(),
        muted_ink = "#666666",
    )
}

fn header(out: &mut String, resume: &StandardResume) {
    let info = &resume.basic_info;
    out.push_str("<header>\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&info.full_name)));

    let contact: Vec<String> = [&info.email, &info.phone, &info.location]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| escape_html(s))
        .collect();
    if !contact.is_empty() {
        out.push_str(&format!(
            "<div class=\"contact\">{}</div>\n",
            contact.join(" · ")
        ));
    }
    out.push_str("</header>\n");
}

fn section(out: &mut String, resume: &StandardResume, id: &str) {
    match id {
        "education" => education(out, resume),
        "work_experience" => work_experience(out, resume),
        "research" => research(out, resume),
        "skills" => skills(out, resume),
        "awards" => awards(out, resume),
        _ => {}
    }
}

fn entry_head(out: &mut String, left: &str, dates: Option<&str>) {
    out.push_str("<div class=\"entry-head\">");
    out.push_str(&format!("<strong>{}</strong>", escape_html(left)));
    if let Some(d) = dates {
        out.push_str(&format!("<span class=\"dates\">{}</span>", escape_html(d)));
    }
    out.push_str("</div>\n");
}

fn education(out: &mut String, resume: &StandardResume) {
    if resume.education.is_empty() {
        return;
    }
    out.push_str("<section id=\"education\">\n<h2>Education</h2>\n");
    for e in &resume.education {
        let dates = StandardResume::date_span(&e.start_date, e.end_date.as_deref());
        out.push_str("<div class=\"entry\">\n");
        entry_head(out, &e.school, Some(&dates));
        let mut detail = format!("{}, {}", e.degree, e.major);
        if let Some(gpa) = &e.gpa {
            detail.push_str(&format!(" (GPA {gpa})"));
        }
        out.push_str(&format!("<p class=\"detail\">{}</p>\n", escape_html(&detail)));
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn work_experience(out: &mut String, resume: &StandardResume) {
    if resume.work_experience.is_empty() {
        return;
    }
    out.push_str("<section id=\"work_experience\">\n<h2>Experience</h2>\n");
    for w in &resume.work_experience {
        let dates = StandardResume::date_span(&w.start_date, w.end_date.as_deref());
        out.push_str("<div class=\"entry\">\n");
        entry_head(out, &format!("{} — {}", w.title, w.company), Some(&dates));
        out.push_str(&format!(
            "<p class=\"detail\">{}</p>\n",
            escape_html(&w.summary)
        ));
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn research(out: &mut String, resume: &StandardResume) {
    if resume.research.is_empty() {
        return;
    }
    out.push_str("<section id=\"research\">\n<h2>Research</h2>\n");
    for r in &resume.research {
        out.push_str("<div class=\"entry\">\n");
        entry_head(out, &r.project, None);
        out.push_str(&format!(
            "<p class=\"detail\">{} — {}</p>\n",
            escape_html(&r.role),
            escape_html(&r.summary)
        ));
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn skills(out: &mut String, resume: &StandardResume) {
    if resume.skills.is_empty() {
        return;
    }
    out.push_str("<section id=\"skills\">\n<h2>Skills</h2>\n<ul class=\"skills\">\n");
    for s in &resume.skills {
        out.push_str(&format!("<li>{}</li>\n", escape_html(s)));
    }
    out.push_str("</ul>\n</section>\n");
}

fn awards(out: &mut String, resume: &StandardResume) {
    if resume.awards.is_empty() {
        return;
    }
    out.push_str("<section id=\"awards\">\n<h2>Awards</h2>\n");
    for a in &resume.awards {
        out.push_str("<div class=\"entry\">\n");
        entry_head(out, &a.title, Some(&a.date));
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}
