// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for unit tests: small generated PDFs and a scripted
// recognition engine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::types::OcrLanguage;

use crate::ocr::engine::{EngineFactory, RecognitionEngine};
use crate::render::PageImage;

/// Width and height of every fixture page, in points.
pub(crate) const PAGE_SIDE_PT: f32 = 300.0;

/// A PDF with `count` pages, each showing "Page n". Page size and font are
/// inherited from the page-tree root, not set on the pages.
pub(crate) fn pdf_with_pages(count: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));

    let mut kids = Vec::new();
    for n in 1..=count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(40), Object::Integer(150)]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        )));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
    }

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(count as i64));
    pages.set("Kids", Object::Array(kids));
    pages.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_SIDE_PT as i64),
            Object::Integer(PAGE_SIDE_PT as i64),
        ]),
    );
    pages.set("Resources", Object::Dictionary(resources));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

// -- Scripted engine ------------------------------------------------------------

/// What the scripted engines do on particular pages.
#[derive(Debug, Default)]
struct Script {
    fail_init_on: Option<usize>,
    fail_pages: HashSet<u32>,
    panic_pages: HashSet<u32>,
    delays: HashMap<u32, Duration>,
    blank: bool,
}

#[derive(Debug, Clone, Copy)]
struct PageRecord {
    engine: usize,
    start: Instant,
    end: Instant,
}

/// Counters shared by a factory and every engine it created.
#[derive(Debug, Default)]
pub(crate) struct EngineStats {
    attempts: AtomicUsize,
    created: AtomicUsize,
    terminated: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    pages: Mutex<HashMap<u32, PageRecord>>,
}

impl EngineStats {
    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn terminated(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Most engines seen recognizing at the same moment.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn engine_for_page(&self, page: u32) -> Option<usize> {
        self.pages.lock().unwrap().get(&page).map(|record| record.engine)
    }

    /// When recognition of `page` started and ended.
    pub(crate) fn span(&self, page: u32) -> Option<(Instant, Instant)> {
        self.pages
            .lock()
            .unwrap()
            .get(&page)
            .map(|record| (record.start, record.end))
    }
}

/// Factory for [`ScriptedEngine`]s. Recognized text is `text of page n`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFactory {
    script: Arc<Script>,
    stats: Arc<EngineStats>,
}

impl ScriptedFactory {
    fn script_mut(&mut self) -> &mut Script {
        Arc::get_mut(&mut self.script).expect("configure the script before use")
    }

    /// The `attempt`-th engine creation (0-based, in call order) fails.
    pub(crate) fn fail_init_on(mut self, attempt: usize) -> Self {
        self.script_mut().fail_init_on = Some(attempt);
        self
    }

    pub(crate) fn fail_on_page(mut self, page: u32) -> Self {
        self.script_mut().fail_pages.insert(page);
        self
    }

    pub(crate) fn panic_on_page(mut self, page: u32) -> Self {
        self.script_mut().panic_pages.insert(page);
        self
    }

    pub(crate) fn delay_page(mut self, page: u32, delay: Duration) -> Self {
        self.script_mut().delays.insert(page, delay);
        self
    }

    /// Every page recognizes as whitespace only.
    pub(crate) fn blank_text(mut self) -> Self {
        self.script_mut().blank = true;
        self
    }

    pub(crate) fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }
}

impl EngineFactory for ScriptedFactory {
    type Engine = ScriptedEngine;

    fn create(&self, _language: &OcrLanguage) -> Result<ScriptedEngine> {
        let attempt = self.stats.attempts.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_init_on == Some(attempt) {
            return Err(PdfwerkError::EngineInit(format!(
                "scripted failure on attempt {attempt}"
            )));
        }
        let id = self.stats.created.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedEngine {
            id,
            script: Arc::clone(&self.script),
            stats: Arc::clone(&self.stats),
            terminated: false,
        })
    }
}

pub(crate) struct ScriptedEngine {
    id: usize,
    script: Arc<Script>,
    stats: Arc<EngineStats>,
    terminated: bool,
}

impl RecognitionEngine for ScriptedEngine {
    fn recognize(&mut self, page: &PageImage) -> Result<String> {
        let page_number = page.page_number;
        let start = Instant::now();
        let now_active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now_active, Ordering::SeqCst);

        if let Some(delay) = self.script.delays.get(&page_number) {
            std::thread::sleep(*delay);
        }
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
        self.stats.pages.lock().unwrap().insert(
            page_number,
            PageRecord {
                engine: self.id,
                start,
                end: Instant::now(),
            },
        );

        if self.script.panic_pages.contains(&page_number) {
            panic!("scripted panic on page {page_number}");
        }
        if self.script.fail_pages.contains(&page_number) {
            return Err(PdfwerkError::OcrError(format!(
                "scripted failure on page {page_number}"
            )));
        }
        if self.script.blank {
            return Ok(" \n ".to_string());
        }
        Ok(format!("text of page {page_number}"))
    }

    fn terminate(&mut self) -> Result<()> {
        assert!(!self.terminated, "engine {} terminated twice", self.id);
        self.terminated = true;
        self.stats.terminated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
