//! Ledger layout: a two-column resume with a tinted sidebar. Same inputs as
//! the gazette layout; only the arrangement differs.

use crate::templates::order::SectionOrder;
use crate::templates::standard::StandardResume;
use crate::templates::theme::{escape_html, ThemePalette};

/// Renders the resume as a self-contained HTML document with the sidebar
/// sections in a tinted left column. Empty sections are skipped; an empty
/// sidebar list leaves the column blank rather than collapsing the grid.
pub fn render(resume: &StandardResume, palette: &ThemePalette, order: &SectionOrder) -> String {
    let mut side = String::new();
    for id in &order.sidebar {
        section(&mut side, resume, id, true);
    }

    let mut main = String::new();
    header(&mut main, resume);
    for id in &order.main {
        section(&mut main, resume, id, false);
    }

    page(palette, &side, &main)
}

fn page(palette: &ThemePalette, side: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body {{ font-family: Helvetica, Arial, sans-serif; color: {ink}; margin: 0; line-height: 1.4; }}
.sheet {{ display: grid; grid-template-columns: 17rem 1fr; min-height: 100vh; }}
aside {{ background: {tint}; padding: 2rem 1.4rem; }}
main {{ padding: 2rem 2.2rem; }}
h1 {{ color: {accent}; margin: 0 0 0.2rem; font-size: 1.7rem; }}
.contact {{ color: #555555; font-size: 0.85rem; margin-bottom: 1.2rem; }}
h2 {{ color: {accent}; font-size: 0.95rem; text-transform: uppercase; letter-spacing: 0.1em; margin: 1.2rem 0 0.5rem; }}
aside h2 {{ border-bottom: 1px solid {accent}; padding-bottom: 0.2rem; }}
.entry {{ margin-bottom: 0.65rem; }}
.dates {{ color: #555555; font-size: 0.8rem; }}
.detail {{ margin: 0.1rem 0 0; font-size: 0.92rem; }}
.chip {{ display: inline-block; background: #ffffff; border: 1px solid {accent}; border-radius: 3px; padding: 0.1rem 0.45rem; margin: 0 0.3rem 0.3rem 0; font-size: 0.82rem; }}
</style>
</head>
<body>
<div class="sheet">
<aside>
{side}</aside>
<main>
{main}</main>
</div>
</body>
</html>
"#,
        ink = palette.ink,
        accent = palette.accent,
        tint = palette.muted(),
    )
}

fn header(out: &mut String, resume: &StandardResume) {
    let info = &resume.basic_info;
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
}

fn section(out: &mut String, resume: &StandardResume, id: &str, compact: bool) {
    match id {
        "education" => education(out, resume),
        "work_experience" => work_experience(out, resume),
        "research" => research(out, resume),
        "skills" => skills(out, resume, compact),
        "awards" => awards(out, resume),
        _ => {}
    }
}

fn education(out: &mut String, resume: &StandardResume) {
    if resume.education.is_empty() {
        return;
    }
    out.push_str("<section id=\"education\">\n<h2>Education</h2>\n");
    for e in &resume.education {
        let dates = StandardResume::date_span(&e.start_date, e.end_date.as_deref());
        out.push_str(&format!(
            "<div class=\"entry\"><strong>{}</strong> <span class=\"dates\">{}</span>",
            escape_html(&e.school),
            escape_html(&dates)
        ));
        let mut detail = format!("{}, {}", e.degree, e.major);
        if let Some(gpa) = &e.gpa {
            detail.push_str(&format!(" (GPA {gpa})"));
        }
        out.push_str(&format!(
            "<p class=\"detail\">{}</p></div>\n",
            escape_html(&detail)
        ));
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
        out.push_str(&format!(
            "<div class=\"entry\"><strong>{}</strong>, {} <span class=\"dates\">{}</span>",
            escape_html(&w.title),
            escape_html(&w.company),
            escape_html(&dates)
        ));
        out.push_str(&format!(
            "<p class=\"detail\">{}</p></div>\n",
            escape_html(&w.summary)
        ));
    }
    out.push_str("</section>\n");
}

fn research(out: &mut String, resume: &StandardResume) {
    if resume.research.is_empty() {
        return;
    }
    out.push_str("<section id=\"research\">\n<h2>Research</h2>\n");
    for r in &resume.research {
        out.push_str(&format!(
            "<div class=\"entry\"><strong>{}</strong>",
            escape_html(&r.project)
        ));
        out.push_str(&format!(
            "<p class=\"detail\">{}. {}</p></div>\n",
            escape_html(&r.role),
            escape_html(&r.summary)
        ));
    }
    out.push_str("</section>\n");
}

fn skills(out: &mut String, resume: &StandardResume, compact: bool) {
    if resume.skills.is_empty() {
        return;
    }
    out.push_str("<section id=\"skills\">\n<h2>Skills</h2>\n");
    if compact {
        for s in &resume.skills {
            out.push_str(&format!("<span class=\"chip\">{}</span>\n", escape_html(s)));
        }
    } else {
        out.push_str(&format!(
            "<p class=\"detail\">{}</p>\n",
            escape_html(&resume.skills.join(" · "))
        ));
    }
    out.push_str("</section>\n");
}

fn awards(out: &mut String, resume: &StandardResume) {
    if resume.awards.is_empty() {
        return;
    }
    out.push_str("<section id=\"awards\">\n<h2>Awards</h2>\n");
    for a in &resume.awards {
        out.push_str(&format!(
            "<div class=\"entry\">{} <span class=\"dates\">{}</span></div>\n",
            escape_html(&a.title),
            escape_html(&a.date)
        ));
    }
    out.push_str("</section>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentKind;
    use crate::modules::selection::ModuleSelection;
    use crate::templates::theme::palette;
    use serde_json::json;

    fn sample_resume() -> StandardResume {
        let form = json!({
            "basic_info": {
                "full_name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555-0100",
                "location": "Berlin"
            },
            "education": [
                { "school": "TU Berlin", "degree": "BSc", "major": "CS", "start_date": "2019" }
            ],
            "skills": { "items": ["Rust", "SQL"] },
            "awards": [{ "title": "Dean's List", "date": "2022" }]
        });
        let selection = ModuleSelection::default_for(DocumentKind::Resume);
        StandardResume::from_form(&form, &selection)
    }

    #[test]
    fn test_sidebar_sections_land_in_the_aside() {
        let html = render(
            &sample_resume(),
            palette("navy").unwrap(),
            &SectionOrder::with_sidebar(),
        );

        let aside_end = html.find("</aside>").unwrap();
        let skills_at = html.find("id=\"skills\"").unwrap();
        let education_at = html.find("id=\"education\"").unwrap();
        assert!(skills_at < aside_end, "skills belong in the sidebar");
        assert!(education_at > aside_end, "education belongs in main");
        assert!(html.contains("class=\"chip\""));
    }

    #[test]
    fn test_main_skills_render_inline_not_as_chips() {
        let order = SectionOrder::from_lists(
            vec!["skills".to_string(), "education".to_string()],
            vec![],
        )
        .unwrap();
        let html = render(&sample_resume(), palette("navy").unwrap(), &order);
        assert!(!html.contains("class=\"chip\""));
        assert!(html.contains("Rust · SQL"));
    }

    #[test]
    fn test_tint_comes_from_the_palette() {
        let p = palette("forest").unwrap();
        let html = render(&sample_resume(), p, &SectionOrder::with_sidebar());
        assert!(html.contains(&p.muted()));
        assert!(html.contains(p.accent));
    }

    #[test]
    fn test_same_shape_renders_in_both_layouts() {
        let resume = sample_resume();
        let p = palette("navy").unwrap();
        let ledger = render(&resume, p, &SectionOrder::with_sidebar());
        let gazette =
            crate::templates::gazette::render(&resume, p, &SectionOrder::single_column());
        for needle in ["Jane Doe", "TU Berlin", "Dean&#39;s List"] {
            assert!(ledger.contains(needle), "{needle} missing from ledger");
            assert!(gazette.contains(needle), "{needle} missing from gazette");
        }
    }
}
