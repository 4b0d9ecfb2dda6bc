//! Payslip rendering in two stages: a pure layout pass that produces the
//! fixed single-page line model (everything the document will say, in
//! order), and a genpdf pass that draws it. The layout is deterministic
//! for identical inputs; the generation date is an input, not wall-clock.

use std::path::PathBuf;

use chrono::NaiveDate;
use genpdf::elements::{Break, Paragraph, TableLayout};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{Alignment, Element, SimplePageDecorator};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{PayrollError, PayrollResult};
use crate::model::user::User;
use crate::payroll::calculator::PayrollBreakdown;
use crate::payroll::Period;

const MASTHEAD: &str = "LANGSAPOST";
const TITLE: &str = "SLIP GAJI KARYAWAN";
const FOOTER: [&str; 2] = [
    "Catatan: Slip gaji ini dihasilkan secara otomatis oleh sistem.",
    "Untuk pertanyaan, hubungi HRD di info@langsapost.com",
];

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("-")
}

/// Indonesian-locale currency: thousands grouped with dots, no
/// fractional digits. `3170000` formats as `Rp 3.170.000`.
pub fn format_rupiah(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlipLine {
    Blank,
    SectionHeader(String),
    Entry {
        label: String,
        amount: String,
        bold: bool,
    },
    Rule,
}

/// The complete line model of one payslip. Building it is side-effect
/// free, so tests can assert on content without touching fonts or PDFs.
#[derive(Debug, Clone, PartialEq)]
pub struct SlipDocument {
    pub masthead: String,
    pub title: String,
    pub info: Vec<(String, String)>,
    pub lines: Vec<SlipLine>,
    pub footer: Vec<String>,
}

pub fn layout_slip(
    author: &User,
    period: Period,
    breakdown: &PayrollBreakdown,
    generated_on: NaiveDate,
) -> SlipDocument {
    let info = vec![
        ("Nama".to_string(), author.name.clone()),
        (
            "NIK".to_string(),
            author.nik.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Email".to_string(), author.email.clone()),
        (
            "Periode".to_string(),
            format!("{} {}", month_name(period.month), period.year),
        ),
        (
            "Tanggal Cetak".to_string(),
            generated_on.format("%d/%m/%Y").to_string(),
        ),
    ];

    let entry = |label: &str, amount: Decimal, bold: bool| SlipLine::Entry {
        label: label.to_string(),
        amount: format_rupiah(amount),
        bold,
    };

    let lines = vec![
        SlipLine::SectionHeader("RINCIAN GAJI".to_string()),
        entry("Gaji Pokok", breakdown.base, false),
        SlipLine::Entry {
            label: format!("Bonus Artikel ({} artikel)", breakdown.articles_count),
            amount: format_rupiah(breakdown.article_bonus),
            bold: false,
        },
        entry("Bonus Views", breakdown.view_bonus, false),
        SlipLine::Blank,
        entry("TOTAL GAJI KOTOR", breakdown.gross, true),
        SlipLine::Blank,
        SlipLine::SectionHeader("POTONGAN:".to_string()),
        entry("Pajak (5%)", breakdown.deductions, false),
        SlipLine::Blank,
        SlipLine::Rule,
        entry("TOTAL GAJI BERSIH", breakdown.total, true),
    ];

    SlipDocument {
        masthead: MASTHEAD.to_string(),
        title: TITLE.to_string(),
        info,
        lines,
        footer: FOOTER.iter().map(|s| s.to_string()).collect(),
    }
}

/// The seam the batch pipeline depends on; a failure is fatal for one
/// author's slip only, never for the whole run.
pub trait SlipRenderer {
    fn render(&self, slip: &SlipDocument) -> PayrollResult<Vec<u8>>;
}

/// genpdf-backed renderer. Loads the font family from `font_dir` on each
/// render; a payroll run touches at most a few dozen slips.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font_dir: PathBuf,
}

impl PdfRenderer {
    pub fn new(font_dir: impl Into<PathBuf>) -> Self {
        PdfRenderer {
            font_dir: font_dir.into(),
        }
    }

    fn load_font(&self) -> PayrollResult<genpdf::fonts::FontFamily<genpdf::fonts::FontData>> {
        // Arial if the family TTFs were dropped into the font dir,
        // LiberationSans otherwise.
        if let Ok(family) = genpdf::fonts::from_files(&self.font_dir, "Arial", None) {
            return Ok(family);
        }
        genpdf::fonts::from_files(&self.font_dir, "LiberationSans", None)
            .map_err(|e| PayrollError::render(format!("font loading failed: {e}")))
    }
}

fn two_column_table() -> TableLayout {
    TableLayout::new(vec![3, 2])
}

fn flush_entries(doc: &mut genpdf::Document, table: &mut TableLayout, pending: &mut bool) {
    if *pending {
        let full = std::mem::replace(table, two_column_table());
        doc.push(full);
        *pending = false;
    }
}

impl SlipRenderer for PdfRenderer {
    fn render(&self, slip: &SlipDocument) -> PayrollResult<Vec<u8>> {
        let render_err = |e: genpdf::error::Error| PayrollError::render(e.to_string());

        let mut doc = genpdf::Document::new(self.load_font()?);
        doc.set_title(slip.title.clone());
        doc.set_font_size(11);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(18);
        doc.set_page_decorator(decorator);

        let mut masthead = Paragraph::new("");
        masthead.push(StyledString::new(
            slip.masthead.clone(),
            Style::new()
                .bold()
                .with_font_size(24)
                .with_color(Color::Rgb(255, 79, 79)),
        ));
        doc.push(masthead);

        let mut title = Paragraph::new("");
        title.push(StyledString::new(
            slip.title.clone(),
            Style::new().bold().with_font_size(16),
        ));
        doc.push(title);
        doc.push(Break::new(2));

        let mut info = TableLayout::new(vec![1, 3]);
        for (label, value) in &slip.info {
            info.row()
                .element(Paragraph::new(label.clone()))
                .element(Paragraph::new(format!(": {value}")))
                .push()
                .map_err(render_err)?;
        }
        doc.push(info);
        doc.push(Break::new(2));

        let mut entries = two_column_table();
        let mut pending = false;
        for line in &slip.lines {
            match line {
                SlipLine::Entry {
                    label,
                    amount,
                    bold,
                } => {
                    let style = if *bold {
                        Style::new().bold().with_font_size(12)
                    } else {
                        Style::new()
                    };
                    entries
                        .row()
                        .element(Paragraph::new("").styled_string(label.clone(), style.clone()))
                        .element(
                            Paragraph::new("")
                                .styled_string(amount.clone(), style)
                                .aligned(Alignment::Right),
                        )
                        .push()
                        .map_err(render_err)?;
                    pending = true;
                }
                SlipLine::SectionHeader(text) => {
                    flush_entries(&mut doc, &mut entries, &mut pending);
                    let mut header = Paragraph::new("");
                    header.push(StyledString::new(
                        text.clone(),
                        Style::new().bold().with_font_size(12),
                    ));
                    doc.push(header);
                }
                SlipLine::Blank => {
                    flush_entries(&mut doc, &mut entries, &mut pending);
                    doc.push(Break::new(1));
                }
                SlipLine::Rule => {
                    flush_entries(&mut doc, &mut entries, &mut pending);
                    doc.push(
                        Paragraph::new("_".repeat(72)).styled(Style::new().with_font_size(8)),
                    );
                }
            }
        }
        flush_entries(&mut doc, &mut entries, &mut pending);

        doc.push(Break::new(3));
        for note in &slip.footer {
            doc.push(
                Paragraph::new(note.clone())
                    .styled(Style::new().with_font_size(9).with_color(Color::Rgb(128, 128, 128))),
            );
        }

        let mut out = Vec::new();
        doc.render(&mut out).map_err(render_err)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn author() -> User {
        User {
            id: 7,
            name: "Siti Rahma".to_string(),
            email: "siti@langsapost.com".to_string(),
            password_hash: String::new(),
            role: "writer".to_string(),
            nik: Some("WRT-007".to_string()),
            phone: None,
            avatar_url: None,
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn breakdown() -> PayrollBreakdown {
        PayrollBreakdown {
            articles_count: 3,
            base: dec("3000000"),
            article_bonus: dec("150000"),
            view_bonus: dec("20000"),
            gross: dec("3170000"),
            deductions: dec("158500"),
            total: dec("3011500"),
        }
    }

    fn slip() -> SlipDocument {
        layout_slip(
            &author(),
            Period::new(5, 2025).unwrap(),
            &breakdown(),
            NaiveDate::from_ymd_opt(2025, 6, 25).unwrap(),
        )
    }

    #[test]
    fn rupiah_grouping() {
        assert_eq!(format_rupiah(dec("3170000")), "Rp 3.170.000");
        assert_eq!(format_rupiah(dec("158500")), "Rp 158.500");
        assert_eq!(format_rupiah(dec("950")), "Rp 950");
        assert_eq!(format_rupiah(dec("0")), "Rp 0");
        assert_eq!(format_rupiah(dec("1000000000")), "Rp 1.000.000.000");
    }

    #[test]
    fn rupiah_drops_fractional_digits() {
        assert_eq!(format_rupiah(dec("158500.4")), "Rp 158.500");
        assert_eq!(format_rupiah(dec("158500.5")), "Rp 158.501");
    }

    #[test]
    fn month_names_are_indonesian() {
        assert_eq!(month_name(1), "Januari");
        assert_eq!(month_name(12), "Desember");
        assert_eq!(month_name(0), "-");
        assert_eq!(month_name(13), "-");
    }

    #[test]
    fn layout_embeds_the_net_total_verbatim() {
        let slip = slip();
        let net = slip.lines.iter().find_map(|l| match l {
            SlipLine::Entry { label, amount, bold } if label == "TOTAL GAJI BERSIH" => {
                Some((amount.clone(), *bold))
            }
            _ => None,
        });
        assert_eq!(net, Some(("Rp 3.011.500".to_string(), true)));
    }

    #[test]
    fn layout_shows_article_count_and_period() {
        let slip = slip();
        assert!(slip.lines.iter().any(|l| matches!(
            l,
            SlipLine::Entry { label, .. } if label == "Bonus Artikel (3 artikel)"
        )));
        assert!(slip
            .info
            .iter()
            .any(|(label, value)| label == "Periode" && value == "Mei 2025"));
        assert!(slip
            .info
            .iter()
            .any(|(label, value)| label == "Tanggal Cetak" && value == "25/06/2025"));
    }

    #[test]
    fn missing_tax_identifier_prints_dash() {
        let mut author = author();
        author.nik = None;
        let slip = layout_slip(
            &author,
            Period::new(5, 2025).unwrap(),
            &breakdown(),
            NaiveDate::from_ymd_opt(2025, 6, 25).unwrap(),
        );
        assert!(slip
            .info
            .iter()
            .any(|(label, value)| label == "NIK" && value == "-"));
    }

    #[test]
    fn rule_immediately_precedes_the_net_total() {
        let slip = slip();
        let rule_at = slip
            .lines
            .iter()
            .position(|l| matches!(l, SlipLine::Rule))
            .unwrap();
        assert!(matches!(
            &slip.lines[rule_at + 1],
            SlipLine::Entry { label, .. } if label == "TOTAL GAJI BERSIH"
        ));
    }

    #[test]
    fn layout_is_deterministic_for_identical_inputs() {
        assert_eq!(slip(), slip());
    }
}
