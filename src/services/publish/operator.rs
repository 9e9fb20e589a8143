// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::parsing::parse_u128_hex;
use crate::domain::transcript::Step;
use alloy::primitives::B256;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeChoice {
    Level(u128),
    Stop,
    /// Input that is neither a number nor a stop word.
    Unparsed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSubmit {
    Retry,
    Wait,
}

/// The human (or script) deciding fees while a transcript is published.
#[async_trait]
pub trait Operator: Send {
    async fn choose_fee(&mut self, step: &Step, levels: &[u128]) -> Result<FeeChoice, AppError>;

    async fn after_submit(&mut self, step: &Step, hash: B256) -> Result<AfterSubmit, AppError>;
}

pub fn parse_fee_answer(answer: &str) -> FeeChoice {
    let trimmed = answer.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "stop" | "quit" | "q" => return FeeChoice::Stop,
        _ => {}
    }
    let parsed = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        parse_u128_hex(trimmed)
    } else {
        trimmed.parse::<u128>().ok()
    };
    match parsed {
        Some(level) => FeeChoice::Level(level),
        None => FeeChoice::Unparsed(trimmed.to_string()),
    }
}

pub fn parse_after_submit(answer: &str) -> AfterSubmit {
    if answer.trim() == "retry" {
        AfterSubmit::Retry
    } else {
        AfterSubmit::Wait
    }
}

/// Prompts on stdout and reads answers line by line from stdin.
pub struct StdioOperator {
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
}

impl Default for StdioOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl StdioOperator {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
        }
    }

    async fn ask(&mut self, prompt: &str) -> Result<Option<String>, AppError> {
        self.stdout.write_all(prompt.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(self.lines.next_line().await?)
    }
}

#[async_trait]
impl Operator for StdioOperator {
    async fn choose_fee(&mut self, step: &Step, levels: &[u128]) -> Result<FeeChoice, AppError> {
        let listed = levels
            .iter()
            .map(u128::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let prompt = format!(
            "{} (nonce {})\nChoose the gas price you would like to use:\n{}\n",
            step.description,
            step.nonce(),
            listed
        );
        // EOF means nobody is left to answer.
        Ok(match self.ask(&prompt).await? {
            Some(line) => parse_fee_answer(&line),
            None => FeeChoice::Stop,
        })
    }

    async fn after_submit(&mut self, _step: &Step, hash: B256) -> Result<AfterSubmit, AppError> {
        let prompt = format!(
            "sent: {hash:#x}\ntype retry if you would like to try with more gas\n"
        );
        Ok(match self.ask(&prompt).await? {
            Some(line) => parse_after_submit(&line),
            None => AfterSubmit::Wait,
        })
    }
}
