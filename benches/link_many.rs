//! This bench reads a generated project of interlinked folios, with a mix of
//! permanent and placeholder indices, and writes the renumbered result back.

#![allow(missing_docs)]

use std::{fmt::Write as _, fs, path::Path};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use reqfolio::Standard;
use tempfile::TempDir;

const FOLIOS: usize = 20;
const PER_FOLIO: usize = 50;

/// Each folio holds a chain of permanent requirements, each parented by the
/// one before, plus a placeholder child for every fifth requirement.
fn preseed_project(root: &Path) {
    fs::write(root.join("config.yaml"), "customers: [acme]\n").unwrap();
    fs::create_dir_all(root.join("project")).unwrap();
    fs::create_dir_all(root.join("customer")).unwrap();

    let mut next = 1;
    let mut placeholder = 1;
    for folio in 0..FOLIOS {
        let mut text = String::new();
        for position in 0..PER_FOLIO {
            writeln!(text, "r{next:08}:\n  title: Requirement {next}").unwrap();
            if position > 0 {
                writeln!(text, "  parent_idx: [r{:08}]", next - 1).unwrap();
            }
            if position % 5 == 0 {
                writeln!(text, "  child_idx: [new{placeholder}]").unwrap();
                writeln!(
                    text,
                    "\nnew{placeholder}:\n  title: Draft {placeholder}\n  related_idx: [r{next:08}]"
                )
                .unwrap();
                placeholder += 1;
            }
            text.push('\n');
            next += 1;
        }
        fs::write(root.join("project").join(format!("folio{folio:02}.yaml")), text).unwrap();
    }
}

fn read_and_write(c: &mut Criterion) {
    c.bench_function("read, renumber, link and write", |b| {
        b.iter_batched(
            || {
                let tmp_dir = TempDir::new().unwrap();
                preseed_project(tmp_dir.path());
                tmp_dir
            },
            |tmp_dir| {
                let mut standard = Standard::default();
                standard.read(tmp_dir.path()).unwrap();
                assert_eq!(standard.diagnostics().problem_count(), 0);
                standard.write();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, read_and_write);
criterion_main!(benches);
