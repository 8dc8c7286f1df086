// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the command line to the pdfwerk-document crate.
//
// Runners read their inputs, move the heavy work onto the blocking pool, and
// hold the operation's busy guard for as long as they run.

pub mod app_services;
