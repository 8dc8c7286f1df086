// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Localized presentation strings. Display only; nothing here changes how an
// operation behaves.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PdfwerkError;

/// Display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub fn labels(&self) -> &'static Labels {
        match self {
            Self::Zh => &ZH,
            Self::En => &EN,
        }
    }
}

impl FromStr for Locale {
    type Err = PdfwerkError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" => Ok(Self::Zh),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            other => Err(PdfwerkError::InputValidation(format!(
                "unsupported locale `{other}` (expected zh or en)"
            ))),
        }
    }
}

/// Labels for one operation.
#[derive(Debug)]
pub struct OperationLabels {
    pub title: &'static str,
    pub running: &'static str,
}

/// Every user-visible string for one locale.
#[derive(Debug)]
pub struct Labels {
    pub merge: OperationLabels,
    pub split: OperationLabels,
    pub convert: OperationLabels,
    pub compress: OperationLabels,
    pub ocr: OperationLabels,
    pub error_prefix: &'static str,
    pub success: &'static str,
    pub saved_to: &'static str,
    pub page_count: &'static str,
    pub ocr_progress: &'static str,
    pub no_text_recognized: &'static str,
    pub busy: &'static str,
    /// Banner template; `{n}` is replaced by the 1-based page number.
    pub page_banner: &'static str,
    pub failure_marker: &'static str,
}

impl Labels {
    /// Banner line that opens page `page_number` in an OCR transcript.
    pub fn page_banner(&self, page_number: u32) -> String {
        self.page_banner.replace("{n}", &page_number.to_string())
    }

    /// `completed/total` progress line.
    pub fn ocr_progress(&self, completed: u32, total: u32) -> String {
        self.ocr_progress
            .replace("{completed}", &completed.to_string())
            .replace("{total}", &total.to_string())
    }
}

static ZH: Labels = Labels {
    merge: OperationLabels {
        title: "PDF合并",
        running: "正在合并，请耐心等待...",
    },
    split: OperationLabels {
        title: "PDF拆分",
        running: "正在拆分，请耐心等待...",
    },
    convert: OperationLabels {
        title: "PDF转图片",
        running: "正在导出，请耐心等待...",
    },
    compress: OperationLabels {
        title: "PDF压缩",
        running: "正在压缩，请耐心等待...",
    },
    ocr: OperationLabels {
        title: "OCR文字识别",
        running: "正在识别，请耐心等待...",
    },
    error_prefix: "处理出错：",
    success: "处理完成",
    saved_to: "已保存到",
    page_count: "页数",
    ocr_progress: "正在识别中...已完成 {completed}/{total} 页",
    no_text_recognized: "未能识别出文字，请确保PDF文件清晰可读",
    busy: "该操作正在进行中，请稍候",
    page_banner: "==================== 第 {n} 页 ====================",
    failure_marker: "[识别失败]",
};

static EN: Labels = Labels {
    merge: OperationLabels {
        title: "PDF Merge",
        running: "Merging, please wait...",
    },
    split: OperationLabels {
        title: "PDF Split",
        running: "Splitting, please wait...",
    },
    convert: OperationLabels {
        title: "PDF to Image",
        running: "Exporting, please wait...",
    },
    compress: OperationLabels {
        title: "PDF Compress",
        running: "Compressing, please wait...",
    },
    ocr: OperationLabels {
        title: "OCR Text Recognition",
        running: "Recognizing, please wait...",
    },
    error_prefix: "Error: ",
    success: "Completed",
    saved_to: "Saved to",
    page_count: "Pages",
    ocr_progress: "Recognizing... {completed}/{total} pages done",
    no_text_recognized: "No text could be recognized. Make sure the PDF is clear and legible.",
    busy: "This operation is already running, please wait",
    page_banner: "==================== Page {n} ====================",
    failure_marker: "[Recognition failed]",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_substitutes_page_number() {
        assert_eq!(
            Locale::Zh.labels().page_banner(7),
            "==================== 第 7 页 ===================="
        );
        assert!(Locale::En.labels().page_banner(12).contains("Page 12"));
    }

    #[test]
    fn progress_line_substitutes_counts() {
        assert_eq!(
            Locale::En.labels().ocr_progress(2, 5),
            "Recognizing... 2/5 pages done"
        );
    }

    #[test]
    fn locale_parses_common_spellings() {
        assert_eq!("zh-CN".parse::<Locale>().unwrap(), Locale::Zh);
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }
}
