//! ファイル走査のテスト

use std::io::Write;
use std::path::Path;

use cxx_ppgrammar::{
    CompileError, Directive, FileId, FileRegistry, Grammar, collect_macros, scan_file, scan_source,
};
use tempfile::NamedTempFile;

const HEADER: &str = r#"/* config.h */
#ifndef CONFIG_H
#define CONFIG_H

#include <stddef.h>
#include "local.h"

#define VERSION 3
#define MAX(a, b) \
    ((a) > (b) ? (a) : (b))
#define LOG(fmt, ...) fprintf(stderr, fmt, __VA_ARGS__)

#if defined(__GNUC__) && VERSION >= 2 /* multi
   line comment */
int gnu_only;
#elif __has_include(<optional>)
#else
#  warning no compiler support
#endif

#undef VERSION
#pragma once
#endif /* CONFIG_H */
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_scan_file_finds_all_directives() {
    let file = write_temp(HEADER);
    let mut files = FileRegistry::new();
    let found = scan_file(Grammar::global(), &mut files, file.path()).unwrap();

    let names: Vec<_> = found.iter().map(|d| d.directive.name()).collect();
    assert_eq!(
        names,
        vec![
            "ifndef", "define", "include", "include", "define", "define", "define", "if", "elif",
            "else", "warning", "endif", "undef", "pragma", "endif",
        ]
    );

    // ファイルが登録され、位置から引ける
    assert_eq!(files.len(), 1);
    assert_eq!(files.get_path(found[0].loc.file_id), Some(file.path()));
    assert_eq!(found[0].loc.line, 2);
}

#[test]
fn test_continuation_lines_are_joined() {
    let found = scan_source(Grammar::global(), HEADER, FileId::default()).unwrap();
    let max = found
        .iter()
        .find_map(|d| match &d.directive {
            Directive::Define(def) if def.name == "MAX" => Some((d.loc.line, def.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(max.0, 9);
    assert_eq!(max.1.replacement_text(), "((a) > (b) ? (a) : (b))");
}

#[test]
fn test_multiline_comment_stays_in_directive() {
    let found = scan_source(Grammar::global(), HEADER, FileId::default()).unwrap();
    let if_line = found.iter().find(|d| d.directive.name() == "if").unwrap();
    assert!(if_line.node.text().contains("multi\n   line comment"));
    // 次の行はディレクティブではない
    assert_eq!(found.iter().filter(|d| d.loc.line == 15).count(), 0);
}

#[test]
fn test_collect_macros_applies_undef() {
    let found = scan_source(Grammar::global(), HEADER, FileId::default()).unwrap();
    let table = collect_macros(&found);

    assert!(table.is_defined("CONFIG_H"));
    assert!(table.is_defined("MAX"));
    assert!(!table.is_defined("VERSION"));
    assert!(table.get("LOG").unwrap().is_variadic());
    assert_eq!(table.location("MAX").map(|l| l.line), Some(9));
    assert_eq!(table.len(), 3);
}

#[test]
fn test_module_unit() {
    let source = "module;\n#include <cstdio>\nexport module app.core:util;\nimport std;\nimport <vector>;\nint import_count = 0;\n";
    let found = scan_source(Grammar::global(), source, FileId::default()).unwrap();
    let names: Vec<_> = found.iter().map(|d| d.directive.name()).collect();
    assert_eq!(names, vec!["module", "include", "module", "import", "import"]);
}

#[test]
fn test_scan_file_missing() {
    let mut files = FileRegistry::new();
    let err = scan_file(
        Grammar::global(),
        &mut files,
        Path::new("/nonexistent/dir/header.h"),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Io { .. }));
    assert!(files.is_empty());
}

#[test]
fn test_unterminated_comment_in_directive_is_error() {
    let err = scan_source(Grammar::global(), "#define A /* never closed\n", FileId::default())
        .unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }));
    assert_eq!(err.loc().map(|l| l.line), Some(1));
}
