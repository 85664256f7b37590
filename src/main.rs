//! C/C++ Preprocessor Grammar CLI
//!
//! ファイル中のディレクティブ、または1つの文字列をパースして
//! 構文木を S-expression か JSON で出力する

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser as ClapParser;
use cxx_ppgrammar::{
    FileRegistry, Grammar, MacroKind, Rule, SexpPrinter, Variadic, collect_macros, scan_file,
};

/// コマンドライン引数
#[derive(ClapParser)]
#[command(name = "cxx-ppgrammar")]
#[command(version, about = "Parse C/C++ preprocessor directives into syntax trees")]
struct Cli {
    /// 入力ファイル（ディレクティブをすべて走査する）
    input: Option<PathBuf>,

    /// 入力ファイルの代わりにパースする文字列
    #[arg(long = "expr")]
    expr: Option<String>,

    /// --expr に適用する規則名（例: constantExpression）
    #[arg(long = "rule", default_value = "preprocessorLine")]
    rule: String,

    /// JSON で出力
    #[arg(long = "json")]
    json: bool,

    /// S-expression を1行で出力
    #[arg(long = "compact")]
    compact: bool,

    /// 空白・コメントも出力
    #[arg(long = "trivia")]
    trivia: bool,

    /// 構文木の代わりにマクロ定義の一覧を出力
    #[arg(long = "macros")]
    macros: bool,

    /// 規則呼び出しの入れ子の上限
    #[arg(long = "max-depth")]
    max_depth: Option<usize>,

    /// 出力ファイル（省略時は標準出力）
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn main() {
    init_logger();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `PPGRAMMAR_LOG` でログレベルを指定する（例: `PPGRAMMAR_LOG=trace`）
fn init_logger() {
    let mut builder = env_logger::Builder::from_env("PPGRAMMAR_LOG");
    builder.format_indent(Some(2));
    builder.format_timestamp(None);
    builder.init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut builder = Grammar::builder();
    if let Some(depth) = cli.max_depth {
        builder = builder.max_rule_depth(depth);
    }
    let grammar = builder.build();

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if let Some(ref text) = cli.expr {
        // --expr: 1つの文字列を指定した規則でパース
        let rule = Rule::from_name(&cli.rule).ok_or_else(|| format!("unknown rule '{}'", cli.rule))?;
        let node = grammar.parse(rule, text)?;
        if cli.json {
            serde_json::to_writer_pretty(&mut writer, &node)?;
            writeln!(writer)?;
        } else {
            let mut printer = printer(&mut writer, &cli);
            printer.print_tree(&node)?;
        }
        writer.flush()?;
        return Ok(());
    }

    let input = cli.input.as_ref().ok_or("Input file or --expr is required")?;
    let mut files = FileRegistry::new();
    let directives =
        scan_file(&grammar, &mut files, input).map_err(|e| e.format_with_files(&files))?;

    if cli.macros {
        // --macros: #define / #undef を適用した結果を出力
        let table = collect_macros(&directives);
        if cli.json {
            serde_json::to_writer_pretty(&mut writer, &table.sorted())?;
            writeln!(writer)?;
        } else {
            for def in table.sorted() {
                let params = match &def.kind {
                    MacroKind::Object => String::new(),
                    MacroKind::Function { params, variadic } => {
                        let mut names = params.clone();
                        match variadic {
                            Some(Variadic::Anonymous) => names.push("...".to_string()),
                            Some(Variadic::Named(name)) => names.push(format!("{name}...")),
                            None => {}
                        }
                        format!("({})", names.join(", "))
                    }
                };
                writeln!(writer, "{}{} {}", def.name, params, def.replacement_text())?;
            }
        }
    } else if cli.json {
        serde_json::to_writer_pretty(&mut writer, &directives)?;
        writeln!(writer)?;
    } else {
        let mut printer = printer(&mut writer, &cli);
        for scanned in &directives {
            printer.print_scanned(scanned)?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn printer<W: Write>(writer: W, cli: &Cli) -> SexpPrinter<W> {
    let mut printer = SexpPrinter::new(writer);
    printer.set_pretty(!cli.compact);
    printer.set_show_trivia(cli.trivia);
    printer
}
