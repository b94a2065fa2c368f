use crate::core::{ClaimReport, SUMMARY_HEADERS};
use crate::error::{ClaimMapError, ClaimMapResult};
use crate::excel::{LossRunImporter, ReportExporter};
use crate::mapping::InternalField;
use crate::mod_form::ROW_LABELS;
use crate::parser::{parse_session_file, SessionFile};
use crate::session::Session;
use crate::types::{format_number, LossRunTable};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Rows shown in table previews
pub const PREVIEW_ROWS: usize = 5;

/// Inputs shared by commands that work on a session
#[derive(Debug, Clone, Default)]
pub struct SessionArgs {
    /// Uploaded loss-run workbook
    pub file: PathBuf,
    /// Session YAML with mapping and mod form
    pub session: Option<PathBuf>,
    /// Worksheet override
    pub sheet: Option<String>,
    /// `FIELD=COLUMN` overrides; an empty column clears the field
    pub maps: Vec<String>,
    /// Clear the mapping before applying `maps`
    pub restart_mapping: bool,
}

/// Format an amount as whole dollars with thousands separators
fn format_money(n: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted.clone(), None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}${}.{}", sign, grouped, frac),
        None => format!("{}${}", sign, grouped),
    }
}

/// Split a `FIELD=COLUMN` argument
fn parse_map_arg(arg: &str) -> ClaimMapResult<(InternalField, Option<String>)> {
    let (field, column) = arg.split_once('=').ok_or_else(|| {
        ClaimMapError::Mapping(format!("Expected FIELD=COLUMN, got '{}'", arg))
    })?;
    let field: InternalField = field.trim().parse()?;
    let column = column.trim();
    Ok((field, (!column.is_empty()).then(|| column.to_string())))
}

/// Upload the workbook and apply session file, sheet, restart and overrides
pub fn open_session(args: &SessionArgs) -> ClaimMapResult<Session> {
    let mut session = Session::upload(&args.file)?;

    if let Some(path) = &args.session {
        let file = parse_session_file(path)?;
        file.apply(&mut session)?;
    }

    if let Some(sheet) = &args.sheet {
        session.select_sheet(sheet)?;
    }

    if args.restart_mapping {
        session.restart_mapping();
    }

    for arg in &args.maps {
        let (field, column) = parse_map_arg(arg)?;
        session.select(field, column.as_deref())?;
    }

    Ok(session)
}

/// Print a simple aligned table
fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len();

    println!("{}", "─".repeat(total));
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect();
    println!("{}", header_line.join("  ").bold());
    println!("{}", "─".repeat(total));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        println!("{}", line.join("  "));
    }
    println!("{}", "─".repeat(total));
}

fn print_loss_run(table: &LossRunTable, rows: usize) {
    let head = table.head(rows);
    let body: Vec<Vec<String>> = (0..head.row_count())
        .map(|r| head.row(r).iter().map(|c| c.to_string()).collect())
        .collect();
    print_table(&table.column_names(), &body);
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("{} {}", "⚠️ ".yellow(), warning.yellow());
    }
}

/// Print the three report tables
pub fn print_report(report: &ClaimReport) {
    println!("\n{}", "📄 Data Preview".bold().cyan());
    print_loss_run(&report.data, PREVIEW_ROWS);

    println!("\n{}", "📄 Claim Summary Preview".bold().cyan());
    let summary: Vec<Vec<String>> = report
        .summary
        .iter()
        .map(|r| {
            vec![
                r.policy_year.to_string(),
                r.closed.to_string(),
                r.open.to_string(),
                r.total_claims.to_string(),
                format_money(r.total_incurred, 2),
                r.total_payroll
                    .map(|p| format_money(p, 0))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&SUMMARY_HEADERS, &summary);

    println!("\n{}", "📄 Mod History Preview".bold().cyan());
    let history: Vec<Vec<String>> = report
        .mod_history
        .iter()
        .map(|r| vec![r.label.clone(), format_number(r.mod_value)])
        .collect();
    print_table(&["Policy Year", "Mod"], &history);
}

/// Execute the sheets command
pub fn sheets(file: PathBuf) -> ClaimMapResult<()> {
    println!("{}", "📋 Claim Mapper - Worksheets".bold().green());
    println!("   File: {}\n", file.display());

    let names = LossRunImporter::new(&file).sheet_names()?;
    for (idx, name) in names.iter().enumerate() {
        println!("   {:>2}. {}", idx + 1, name.bright_blue());
    }
    println!();
    Ok(())
}

/// Execute the preview command
pub fn preview(file: PathBuf, sheet: Option<String>, rows: usize) -> ClaimMapResult<()> {
    let mut session = Session::upload(&file)?;
    if let Some(sheet) = &sheet {
        session.select_sheet(sheet)?;
    }

    println!("{}", "📋 Claim Mapper - Preview".bold().green());
    println!("   File:  {}", file.display());
    println!("   Sheet: {}", session.sheet().bright_blue());
    println!(
        "   {} columns, {} rows\n",
        session.table().columns.len(),
        session.table().row_count()
    );

    print_loss_run(session.table(), rows);
    Ok(())
}

/// Execute the init command - write a starter session file
pub fn init(file: PathBuf, sheet: Option<String>, output: PathBuf, force: bool) -> ClaimMapResult<()> {
    if output.exists() && !force {
        return Err(ClaimMapError::Validation(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )));
    }

    let mut session = Session::upload(&file)?;
    if let Some(sheet) = &sheet {
        session.select_sheet(sheet)?;
    }

    let template = SessionFile::template(&session);
    let mut yaml = String::new();
    yaml.push_str(&format!(
        "# Columns in '{}': {}\n",
        session.sheet(),
        session.table().column_names().join(", ")
    ));
    yaml.push_str("# history rows: current year first; omit 'year' to count back from the projection year\n");
    yaml.push_str(&template.to_yaml()?);
    fs::write(&output, yaml)?;

    println!("{}", "✅ Session file written".bold().green());
    println!("   {}", output.display());
    let suggested = template.mapping.values().filter(|c| c.is_some()).count();
    println!("   {} of {} fields suggested\n", suggested, InternalField::ALL.len());
    Ok(())
}

/// Print the mapping and mod form state of a session
fn print_session_state(session: &Session) {
    println!("\n{}", "Step 1: Map Columns".bold().cyan());
    let rows: Vec<Vec<String>> = InternalField::ALL
        .iter()
        .map(|f| {
            vec![
                f.name().to_string(),
                f.display_header().to_string(),
                session.mapping().get(*f).unwrap_or("-").to_string(),
                if f.is_required() { "required" } else { "optional" }.to_string(),
            ]
        })
        .collect();
    print_table(&["Field", "Header", "Column", ""], &rows);

    println!("\n{}", "Step 2: MOD values and Payrolls".bold().cyan());
    let entries = session.mod_form.entries();
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| vec![e.label.to_string(), e.year.clone(), e.mod_value.clone(), e.payroll.clone()])
        .collect();
    print_table(&["Row", "Year", "Mod", "Payroll"], &rows);
    if entries.len() < ROW_LABELS.len() {
        println!(
            "   {} of {} rows complete (rows need a year and a mod)",
            entries.len(),
            ROW_LABELS.len()
        );
    }
}

/// Execute the check command
pub fn check(args: SessionArgs) -> ClaimMapResult<()> {
    println!("{}", "📋 Claim Mapper - Check".bold().green());
    println!("   File: {}", args.file.display());

    let session = open_session(&args)?;
    println!("   Sheet: {}", session.sheet().bright_blue());
    print_session_state(&session);

    let missing = session.missing_required();
    if !missing.is_empty() {
        println!();
        return Err(ClaimMapError::MissingFields(missing));
    }

    for field in session.mapping().unmapped_optional() {
        if let Some(default) = field.default_value() {
            println!(
                "{} {} is not mapped; '{}' will be filled in",
                "⚠️ ".yellow(),
                field.name().yellow(),
                default
            );
        }
    }

    println!("\n{}", "✅ Ready to export".bold().green());
    Ok(())
}

/// Execute the export command
pub fn export(
    args: SessionArgs,
    output: Option<String>,
    out_dir: PathBuf,
    verbose: bool,
) -> ClaimMapResult<()> {
    println!("{}", "📋 Claim Mapper - Export".bold().green());
    println!("   Input: {}", args.file.display());

    let mut session = open_session(&args)?;
    if let Some(name) = &output {
        session.set_output_name(name);
    }
    println!("   Sheet: {}", session.sheet().bright_blue());

    if verbose {
        print_session_state(&session);
    }

    let report = session.report()?;
    print_warnings(&report.warnings);
    print_report(&report);

    let path = ReportExporter::new(&report).save(&out_dir, session.output_name())?;

    println!("\n{}", "✅ Export Complete!".bold().green());
    println!("   Excel file: {}\n", path.display());
    Ok(())
}

/// Execute the watch command
pub fn watch(
    args: SessionArgs,
    output: Option<String>,
    out_dir: PathBuf,
    verbose: bool,
) -> ClaimMapResult<()> {
    println!("{}", "👁️  Claim Mapper - Watch Mode".bold().green());
    println!("   Workbook: {}", args.file.display());
    if let Some(session) = &args.session {
        println!("   Session:  {}", session.display());
    }
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    let mut watched: Vec<PathBuf> = Vec::new();
    for path in std::iter::once(&args.file).chain(args.session.iter()) {
        if !path.exists() {
            return Err(ClaimMapError::Validation(format!(
                "File not found: {}",
                path.display()
            )));
        }
        watched.push(path.canonicalize()?);
    }

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| ClaimMapError::Validation(format!("Failed to create file watcher: {}", e)))?;

    let mut dirs: Vec<&Path> = watched.iter().filter_map(|p| p.parent()).collect();
    dirs.sort();
    dirs.dedup();
    for dir in dirs {
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| ClaimMapError::Validation(format!("Failed to watch directory: {}", e)))?;
        tracing::debug!(dir = %dir.display(), "watching");
    }

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&args, output.as_deref(), &out_dir, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && event
                            .path
                            .canonicalize()
                            .map(|p| watched.contains(&p))
                            .unwrap_or(false)
                });

                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(&args, output.as_deref(), &out_dir, verbose);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// One export attempt; failures are reported and watching continues
fn run_watch_action(args: &SessionArgs, output: Option<&str>, out_dir: &Path, verbose: bool) {
    let result = open_session(args).and_then(|mut session| {
        if let Some(name) = output {
            session.set_output_name(name);
        }
        if verbose {
            print_session_state(&session);
        }
        session.export(out_dir)
    });

    match result {
        Ok((report, path)) => {
            print_warnings(&report.warnings);
            print_report(&report);
            println!(
                "{} {}",
                "✅ Export complete:".bold().green(),
                path.display()
            );
        }
        Err(e) => println!("{} {}", "❌ Export failed:".bold().red(), e),
    }
}
