//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 motion-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `directive-check`: 编译演示页面中的所有指令属性并输出诊断

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use motion_runtime::{
    Diagnostic, DiagnosticResult, Directive, ElementId, MotionConfig, ScopeChain,
    compile_directive,
};
use serde::Deserialize;
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let status = Command::new("cargo").args(["llvm-cov", "--version"]).status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            run(
                "cargo fmt --all -- --check",
                Command::new("cargo").args(["fmt", "--all", "--", "--check"]),
            )?;
            run(
                "cargo clippy --workspace --all-targets",
                Command::new("cargo").args(["clippy", "--workspace", "--all-targets"]),
            )?;
            run(
                "cargo test --workspace",
                Command::new("cargo").args(["test", "--workspace"]),
            )?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;
            run(
                "cargo llvm-cov -p motion-runtime --html",
                Command::new("cargo").args(["llvm-cov", "-p", "motion-runtime", "--html"]),
            )?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;
            // xtask 不计入覆盖率口径
            run(
                "cargo llvm-cov --workspace --exclude xtask --html",
                Command::new("cargo").args([
                    "llvm-cov",
                    "--workspace",
                    "--exclude",
                    "xtask",
                    "--html",
                ]),
            )?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "directive-check" => {
            let path = args.next();
            directive_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all         运行 fmt、clippy、test 门禁检查
  cov-runtime       运行 motion-runtime 覆盖率报告
  cov-workspace     运行 workspace 覆盖率报告
  directive-check   检查页面文件中的指令

DIRECTIVE-CHECK:
  cargo xtask directive-check [path]

  不带参数：检查 demos/pages/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 以 x-motion 开头但无法识别的属性名
    - 表达式中无法解析、被跳过的条目
    - 命名映射中不是对象字面量的值
"#
    );
}

//=============================================================================
// directive-check 命令实现
//=============================================================================

/// 默认页面目录（相对于 workspace root）
const DEFAULT_PAGES_DIR: &str = "demos/pages";

/// 检查结果
#[derive(Default)]
struct CheckResult {
    pages_checked: usize,
    directives_checked: usize,
    diagnostics: DiagnosticResult,
}

fn directive_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_PAGES_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定页面路径",
            root.display()
        );
    }

    let files = collect_page_files(&root)?;
    if files.is_empty() {
        eprintln!("未找到页面文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个页面文件...\n", files.len());

    let config = MotionConfig::default();
    let mut result = CheckResult::default();
    for file in &files {
        check_page_file(file, &config, &mut result);
    }

    print_check_result(&result);

    if result.diagnostics.has_errors() {
        anyhow::bail!("指令检查发现错误");
    }
    Ok(())
}

/// 收集路径下的所有页面文件（排序后）
fn collect_page_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "json")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// 页面文件中 directive-check 关心的部分
#[derive(Debug, Deserialize)]
struct PageFile {
    #[serde(default)]
    elements: Vec<ElementFile>,
}

#[derive(Debug, Deserialize)]
struct ElementFile {
    id: u64,
    #[serde(default)]
    attributes: Vec<AttributeFile>,
}

#[derive(Debug, Deserialize)]
struct AttributeFile {
    name: String,
    #[serde(default)]
    value: String,
}

fn check_page_file(file: &Path, config: &MotionConfig, result: &mut CheckResult) {
    let page_id = file.display().to_string();
    match std::fs::read_to_string(file) {
        Ok(content) => check_page_source(&page_id, &content, config, result),
        Err(e) => {
            result.pages_checked += 1;
            result
                .diagnostics
                .push(Diagnostic::error(&page_id, format!("无法读取页面: {e}")));
        }
    }
}

fn check_page_source(
    page_id: &str,
    content: &str,
    config: &MotionConfig,
    result: &mut CheckResult,
) {
    result.pages_checked += 1;

    let page: PageFile = match serde_json::from_str(content) {
        Ok(page) => page,
        Err(e) => {
            result
                .diagnostics
                .push(Diagnostic::error(page_id, format!("页面格式错误: {e}")));
            return;
        }
    };

    for element in &page.elements {
        let source = format!("{page_id}#{}", element.id);

        for attribute in &element.attributes {
            let name = attribute.name.as_str();
            if !name.starts_with(&config.directive_prefix) {
                continue;
            }

            let Some(directive) =
                Directive::from_attribute(name, &attribute.value, &config.directive_prefix)
            else {
                result.diagnostics.push(Diagnostic::error(
                    source.as_str(),
                    format!("无法识别的指令属性 '{name}'"),
                ));
                continue;
            };

            result.directives_checked += 1;
            let label = format!("{source} {}", directive.label(&config.directive_prefix));
            let compiled =
                compile_directive(ElementId(element.id), &directive, &label, &ScopeChain::new());
            result.diagnostics.merge(compiled.diagnostics);
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &CheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个页面, {} 条指令",
        result.pages_checked, result.directives_checked
    );
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{diag}");
    }

    let error_count = result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {error_count} 个错误, {warn_count} 个警告");
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {warn_count} 个警告");
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str) -> CheckResult {
        let mut result = CheckResult::default();
        check_page_source("page.json", content, &MotionConfig::default(), &mut result);
        result
    }

    #[test]
    fn test_directives_are_compiled() {
        let result = check(
            r#"{"elements": [{"id": 1, "attributes": [
                {"name": "class", "value": "hero"},
                {"name": "x-motion", "value": "{x: 1, y 2}"},
                {"name": "x-motion.in-view.opacity.1"}
            ]}]}"#,
        );
        assert_eq!(result.pages_checked, 1);
        assert_eq!(result.directives_checked, 2);
        assert_eq!(result.diagnostics.warn_count(), 1);
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn test_malformed_attribute_is_reported() {
        let result = check(r#"{"elements": [{"id": 1, "attributes": [{"value": "{x: 1}"}]}]}"#);
        assert_eq!(result.directives_checked, 0);
        assert_eq!(result.diagnostics.error_count(), 1);
        assert!(result.diagnostics.diagnostics[0].to_string().contains("name"));
    }
}
