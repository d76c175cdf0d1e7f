pub mod app;
pub mod assign;
pub mod cell;
pub mod config;
pub mod error;
pub mod workbook;

pub use app::{Outcome, Session};
pub use config::Layout;
pub use error::FillError;

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};

fn usage() -> String {
    format!(
        "用法: fill_ids <Excel 文件> [导出文件]\n\
         未给出导出文件时会提示输入，直接回车取消导出。\n\n{}",
        app::RULES
    )
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let mut args = args.into_iter();
    let _exe = args.next();

    let Some(input) = args.next() else {
        println!("{}", usage());
        return Ok(());
    };
    if input == "-h" || input == "--help" {
        println!("{}", usage());
        return Ok(());
    }
    let output = args.next().map(PathBuf::from);
    if args.next().is_some() {
        println!("{}", usage());
        return Ok(());
    }

    let cwd = std::env::current_dir().context("无法获取当前目录")?;
    let mut session = Session::new(Layout::load(&cwd)?);
    session.select(&input.to_string_lossy())?;

    let outcome = match output {
        Some(dest) => session.process(&mut Some(dest))?,
        None => {
            let mut prompt = app::LinePrompt::new(io::stdin().lock(), io::stdout());
            session.process(&mut prompt)?
        }
    };

    match outcome {
        Outcome::Saved {
            path,
            filled,
            first_id,
        } => {
            match first_id {
                Some(first) => println!(
                    "新增 {filled} 个 ID（{first} - {}）",
                    first + filled as u64 - 1
                ),
                None => println!("没有需要生成 ID 的新行"),
            }
            println!("导出完成！文件已保存为: {}", path.display());
        }
        Outcome::SaveCancelled => println!("已取消导出"),
    }
    Ok(())
}
