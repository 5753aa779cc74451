use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use vocab_cli::types::{CheckReport, RunReport};
use vocab_model::{MatchType, NOT_FOUND};

pub fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    println!("Config: {}", report.config_path.display());
    match &report.outputs {
        Some(outputs) => {
            println!("Results: {}", outputs.results.display());
            println!("Unmatched: {}", outputs.unmatched.display());
            if let Some(path) = &outputs.summary_json {
                println!("Summary: {}", path.display());
            }
        }
        None => println!("Dry run: nothing written to {}", report.output_dir.display()),
    }

    let mut totals = Table::new();
    totals.set_header(vec![
        header_cell("Rows"),
        header_cell("Unique"),
        header_cell("Matched"),
        header_cell("Unmatched"),
    ]);
    apply_table_style(&mut totals);
    totals.add_row(vec![
        Cell::new(summary.total_rows),
        Cell::new(summary.unique_terms),
        count_cell(summary.matched, Color::Green),
        count_cell(summary.unmatched, Color::Yellow),
    ]);
    right_align_all(&mut totals);
    println!("{totals}");

    let mut stages = Table::new();
    stages.set_header(vec![
        header_cell("Source"),
        header_cell("Strategy"),
        header_cell("Evaluated"),
        header_cell("Exact"),
        header_cell("Fuzzy"),
        header_cell("Partial"),
        header_cell("Overridden"),
        header_cell("Final rows"),
    ]);
    apply_summary_table_style(&mut stages);
    for stage in &summary.stages {
        let final_rows = summary
            .by_source
            .iter()
            .find(|count| count.source == stage.source)
            .map_or(0, |count| count.matched);
        stages.add_row(vec![
            source_cell(&stage.source),
            dim_cell(stage.strategy),
            Cell::new(stage.evaluated),
            count_cell(stage.exact, Color::Green),
            count_cell(stage.fuzzy, Color::Green),
            count_cell(stage.fuzzy_partial, Color::Green),
            count_cell(stage.overridden, Color::Yellow),
            Cell::new(final_rows).add_attribute(Attribute::Bold),
        ]);
    }
    for index in 2..8 {
        align_column(&mut stages, index, CellAlignment::Right);
    }
    println!("{stages}");

    let mut types = Table::new();
    types.set_header(vec![header_cell("Match type"), header_cell("Rows")]);
    apply_table_style(&mut types);
    for match_type in [
        MatchType::Exact,
        MatchType::Fuzzy,
        MatchType::FuzzyPartial,
        MatchType::Unmatched,
    ] {
        let color = if match_type.is_match() {
            Color::Green
        } else {
            Color::Yellow
        };
        types.add_row(vec![
            Cell::new(match_type),
            count_cell(summary.match_type_count(match_type), color),
        ]);
    }
    align_column(&mut types, 1, CellAlignment::Right);
    println!("{types}");

    if !summary.validated.is_empty() {
        let mut corpora = Table::new();
        corpora.set_header(vec![header_cell("Validated in"), header_cell("Rows")]);
        apply_table_style(&mut corpora);
        for count in &summary.validated {
            corpora.add_row(vec![
                Cell::new(&count.corpus),
                count_cell(count.rows, Color::Green),
            ]);
        }
        corpora.add_row(vec![dim_cell(NOT_FOUND), dim_cell(summary.not_validated)]);
        align_column(&mut corpora, 1, CellAlignment::Right);
        println!("{corpora}");
    }
}

pub fn print_check(report: &CheckReport) {
    println!("Config: {}", report.config_path.display());
    println!("Input terms: {}", report.terms);

    let mut tables = Table::new();
    tables.set_header(vec![header_cell("Role"), header_cell("File"), header_cell("Rows")]);
    apply_table_style(&mut tables);
    for table in &report.tables {
        tables.add_row(vec![
            Cell::new(&table.role),
            dim_cell(table.path.display()),
            Cell::new(table.rows),
        ]);
    }
    align_column(&mut tables, 2, CellAlignment::Right);
    println!("{tables}");

    let mut sources = Table::new();
    sources.set_header(vec![
        header_cell("Source"),
        header_cell("Strategy"),
        header_cell("Cutoff"),
        header_cell("Entries"),
        header_cell("Keys"),
        header_cell("No code"),
    ]);
    apply_table_style(&mut sources);
    for source in &report.sources {
        sources.add_row(vec![
            source_cell(&source.name),
            dim_cell(&source.strategy),
            Cell::new(format!("{:.2}", source.cutoff)),
            Cell::new(source.entries),
            Cell::new(source.distinct_keys),
            count_cell(source.missing_codes, Color::Yellow),
        ]);
    }
    for index in 2..6 {
        align_column(&mut sources, index, CellAlignment::Right);
    }
    println!("{sources}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn right_align_all(table: &mut Table) {
    for column in table.column_iter_mut() {
        column.set_cell_alignment(CellAlignment::Right);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn source_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
