use std::fmt;
use std::io::{Cursor, Read};

use serde::Serialize;
use tracing::{debug, info};
use zip::ZipArchive;

use reten_core::{ConsolidatedRow, OutputConfig};

use crate::analyze_document;

/// One named byte buffer handed to the aggregator — either a single XML
/// document or a ZIP archive of them.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Upload {
            name: name.into(),
            data,
        }
    }
}

/// A failed document or upload, reported without aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingError {
    /// Upload name, or `[ARCHIVE] <zip> -> <entry>` for archive entries.
    pub source: String,
    pub cause: String,
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.cause)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub rows: Vec<ConsolidatedRow>,
    pub errors: Vec<ProcessingError>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Nothing usable at all — distinct from the common partial-success case.
    pub fn is_total_failure(&self) -> bool {
        self.rows.is_empty() && !self.errors.is_empty()
    }
}

// Local-file and end-of-central-directory signatures; the latter covers
// empty archives.
const ZIP_SIGNATURES: [&[u8]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

fn looks_like_zip(data: &[u8]) -> bool {
    ZIP_SIGNATURES.iter().any(|sig| data.starts_with(sig))
}

/// Process a batch of uploads into rows and errors, in encounter order.
///
/// Never fails: every failure path ends in an error-list append, so one bad
/// document cannot prevent the rest of the batch from being processed.
pub fn process_uploads(uploads: &[Upload], config: &OutputConfig) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for upload in uploads {
        debug!(name = %upload.name, bytes = upload.data.len(), "processing upload");
        if looks_like_zip(&upload.data) {
            process_archive(upload, config, &mut outcome);
        } else {
            process_single(&upload.name, &upload.data, config, &mut outcome);
        }
    }

    info!(
        rows = outcome.rows.len(),
        errors = outcome.errors.len(),
        "batch finished"
    );
    outcome
}

fn process_single(source: &str, data: &[u8], config: &OutputConfig, outcome: &mut BatchOutcome) {
    match analyze_document(data) {
        Ok((identity, amounts)) => {
            outcome
                .rows
                .push(ConsolidatedRow::assemble(source, &identity, &amounts, config));
        }
        Err(e) => outcome.errors.push(ProcessingError {
            source: source.to_string(),
            cause: e.to_string(),
        }),
    }
}

fn process_archive(upload: &Upload, config: &OutputConfig, outcome: &mut BatchOutcome) {
    let mut archive = match ZipArchive::new(Cursor::new(upload.data.as_slice())) {
        Ok(archive) => archive,
        // One error for the whole upload, not per entry.
        Err(e) => {
            outcome.errors.push(ProcessingError {
                source: upload.name.clone(),
                cause: format!("unable to read archive: {e}"),
            });
            return;
        }
    };

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                outcome.errors.push(archive_error(
                    &upload.name,
                    &format!("entry #{index}"),
                    &format!("unable to open entry: {e}"),
                ));
                continue;
            }
        };

        let entry_name = entry.name().to_string();
        if !entry_name.to_lowercase().ends_with(".xml") {
            // Non-XML entries are not an error.
            continue;
        }

        let mut data = Vec::new();
        if let Err(e) = entry.read_to_end(&mut data) {
            outcome.errors.push(archive_error(
                &upload.name,
                &entry_name,
                &format!("unable to read entry: {e}"),
            ));
            continue;
        }

        match analyze_document(&data) {
            Ok((identity, amounts)) => outcome.rows.push(ConsolidatedRow::assemble(
                format!("{}::{}", upload.name, entry_name),
                &identity,
                &amounts,
                config,
            )),
            Err(e) => outcome
                .errors
                .push(archive_error(&upload.name, &entry_name, &e.to_string())),
        }
    }
}

fn archive_error(archive: &str, entry: &str, cause: &str) -> ProcessingError {
    ProcessingError {
        source: format!("[ARCHIVE] {archive} -> {entry}"),
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NFE: &str = r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe"><NFe><infNFe Id="NFe111"><ide><nNF>1</nNF></ide><total><retTrib><vRetPIS>10,00</vRetPIS></retTrib></total></infNFe></NFe></nfeProc>"#;
    const NFSE: &str = r#"<CompNfse xmlns="http://www.abrasf.org.br/nfse.xsd"><InfNfse><Numero>42</Numero><Servico><Valores><ValorIss>5,00</ValorIss></Valores></Servico></InfNfse></CompNfse>"#;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn config() -> OutputConfig {
        OutputConfig::default()
    }

    // ── single documents ──────────────────────────────────────────────────────

    #[test]
    fn single_xml_yields_one_row() {
        let uploads = [Upload::new("nota.xml", NFE.into())];
        let outcome = process_uploads(&uploads, &config());
        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.is_clean());
        assert_eq!(outcome.rows[0].file, "nota.xml");
        assert_eq!(outcome.rows[0].has_federal_withholding, "SIM");
    }

    #[test]
    fn bad_xml_yields_one_error_under_upload_name() {
        let uploads = [Upload::new("junk.xml", b"<broken".to_vec())];
        let outcome = process_uploads(&uploads, &config());
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source, "junk.xml");
        assert!(outcome.is_total_failure());
    }

    #[test]
    fn unrecognized_schema_is_an_error_not_a_row() {
        let uploads = [Upload::new("other.xml", b"<receipt/>".to_vec())];
        let outcome = process_uploads(&uploads, &config());
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }

    // ── archives ──────────────────────────────────────────────────────────────

    #[test]
    fn archive_mixes_rows_and_errors() {
        let data = zip_with(&[
            ("a.xml", NFE.as_bytes()),
            ("b.xml", b"<broken"),
            ("c.xml", NFSE.as_bytes()),
        ]);
        let uploads = [Upload::new("batch.zip", data)];
        let outcome = process_uploads(&uploads, &config());

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.rows[0].file, "batch.zip::a.xml");
        assert_eq!(outcome.rows[1].file, "batch.zip::c.xml");
        let error = &outcome.errors[0];
        assert!(error.source.contains("batch.zip"));
        assert!(error.source.contains("b.xml"));
    }

    #[test]
    fn non_xml_entries_are_silently_skipped() {
        let data = zip_with(&[
            ("readme.txt", b"hello".as_slice()),
            ("NOTA.XML", NFE.as_bytes()),
        ]);
        let uploads = [Upload::new("mixed.zip", data)];
        let outcome = process_uploads(&uploads, &config());
        // .XML matches case-insensitively, readme.txt is ignored
        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.is_clean());
    }

    #[test]
    fn corrupt_archive_is_one_error_for_the_upload() {
        let mut data = b"PK\x03\x04".to_vec();
        data.extend_from_slice(b"garbage that is not a central directory");
        let uploads = [Upload::new("corrupt.zip", data)];
        let outcome = process_uploads(&uploads, &config());
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source, "corrupt.zip");
    }

    #[test]
    fn empty_archive_yields_nothing() {
        let data = zip_with(&[]);
        let uploads = [Upload::new("empty.zip", data)];
        let outcome = process_uploads(&uploads, &config());
        assert!(outcome.rows.is_empty());
        assert!(outcome.errors.is_empty());
    }

    // ── ordering ──────────────────────────────────────────────────────────────

    #[test]
    fn encounter_order_is_preserved_and_rerun_is_identical() {
        let uploads = [
            Upload::new("1.xml", NFE.into()),
            Upload::new("2.xml", b"<broken".to_vec()),
            Upload::new("3.xml", NFSE.into()),
            Upload::new("4.xml", b"<broken".to_vec()),
            Upload::new("5.xml", NFE.into()),
        ];
        let first = process_uploads(&uploads, &config());
        assert_eq!(first.rows.len(), 3);
        assert_eq!(first.errors.len(), 2);
        assert_eq!(
            first.rows.iter().map(|r| r.file.as_str()).collect::<Vec<_>>(),
            ["1.xml", "3.xml", "5.xml"]
        );
        assert_eq!(
            first
                .errors
                .iter()
                .map(|e| e.source.as_str())
                .collect::<Vec<_>>(),
            ["2.xml", "4.xml"]
        );

        let second = process_uploads(&uploads, &config());
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.errors, second.errors);
    }

    #[test]
    fn empty_batch_is_empty_outcome() {
        let outcome = process_uploads(&[], &config());
        assert!(outcome.rows.is_empty());
        assert!(outcome.errors.is_empty());
        assert!(!outcome.is_total_failure());
    }
}
