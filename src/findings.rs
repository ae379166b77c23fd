//! Merging of detector findings fetched from an alerting backend.
//!
//! Findings are produced by monitors, a detector owns one or more monitors.
//! The transport is abstracted by [`FindingsSource`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Name of the index holding the findings of a detector type.
pub fn findings_index(detector_type: &str) -> String {
    format!(".opensearch-sap-{}-findings", detector_type.to_lowercase())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Paging and sorting parameters of a findings search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub sort_order: SortOrder,
    pub size: u32,
    pub start_index: u32,
    pub sort_string: String,
    pub search_string: Option<String>,
    pub missing: Option<String>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            sort_order: SortOrder::Asc,
            size: 20,
            start_index: 0,
            sort_string: "id".to_string(),
            search_string: None,
            missing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detector {
    pub id: String,
    pub detector_type: String,
    pub monitor_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLevelQuery {
    pub id: String,
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingDocument {
    pub index: String,
    pub id: String,
    pub found: bool,
    pub document: String,
}

/// A finding as stored by the alerting backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub monitor_id: String,
    pub related_doc_ids: Vec<String>,
    pub index: String,
    pub queries: Vec<DocLevelQuery>,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub documents: Vec<FindingDocument>,
}

/// A finding attributed to the detector owning its monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingDto {
    pub detector_id: String,
    pub id: String,
    pub related_doc_ids: Vec<String>,
    pub index: String,
    pub queries: Vec<DocLevelQuery>,
    pub timestamp: i64,
    pub documents: Vec<FindingDocument>,
}

impl FindingDto {
    fn from_finding(finding: Finding, detector_id: String) -> Self {
        Self {
            detector_id,
            id: finding.id,
            related_doc_ids: finding.related_doc_ids,
            index: finding.index,
            queries: finding.queries,
            timestamp: finding.timestamp,
            documents: finding.documents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsPage<T> {
    pub total_findings: u64,
    pub findings: Vec<T>,
}

impl<T> Default for FindingsPage<T> {
    fn default() -> Self {
        Self {
            total_findings: 0,
            findings: vec![],
        }
    }
}

/// Fetches raw findings of a set of monitors from one findings index.
pub trait FindingsSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_findings(
        &self,
        index: &str,
        monitor_ids: &[String],
        table: &Table,
    ) -> Result<FindingsPage<Finding>, Self::Error>;
}

#[derive(Error, Debug)]
pub enum FindingsError {
    #[error("detector list is empty")]
    EmptyDetectorList(),

    #[error("failed to fetch findings for {target}")]
    Source {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub struct FindingsService<S> {
    source: S,
}

impl<S: FindingsSource> FindingsService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch the findings of every monitor of the detector, one request per monitor.
    pub fn get_findings_by_detector(
        &self,
        detector: &Detector,
        table: &Table,
    ) -> Result<FindingsPage<FindingDto>, FindingsError> {
        let index = findings_index(&detector.detector_type);
        let mapping = monitor_to_detector(std::slice::from_ref(detector));

        let mut result = FindingsPage::default();
        for monitor_id in &detector.monitor_ids {
            let page = self
                .fetch(&index, std::slice::from_ref(monitor_id), table, &mapping)
                .map_err(|err| {
                    tracing::error!(detector = detector.id.as_str(), error = %err, "failed to fetch findings");
                    FindingsError::Source {
                        target: format!("detector {}", detector.id),
                        source: Box::new(err),
                    }
                })?;
            result.total_findings += page.total_findings;
            result.findings.extend(page.findings);
        }
        Ok(result)
    }

    /// Fetch the findings of all given detectors of one type with a single request.
    pub fn get_findings(
        &self,
        detectors: &[Detector],
        detector_type: &str,
        table: &Table,
    ) -> Result<FindingsPage<FindingDto>, FindingsError> {
        if detectors.is_empty() {
            return Err(FindingsError::EmptyDetectorList());
        }

        let mapping = monitor_to_detector(detectors);
        let monitor_ids: Vec<String> = detectors
            .iter()
            .flat_map(|d| d.monitor_ids.iter().cloned())
            .collect();

        self.fetch(&findings_index(detector_type), &monitor_ids, table, &mapping)
            .map_err(|err| {
                let ids: Vec<&str> = detectors.iter().map(|d| d.id.as_str()).collect();
                tracing::error!(detectors = ?ids, error = %err, "failed to fetch findings");
                FindingsError::Source {
                    target: format!("detectors [{}]", ids.join(",")),
                    source: Box::new(err),
                }
            })
    }

    fn fetch(
        &self,
        index: &str,
        monitor_ids: &[String],
        table: &Table,
        mapping: &HashMap<&str, &str>,
    ) -> Result<FindingsPage<FindingDto>, S::Error> {
        let page = self.source.get_findings(index, monitor_ids, table)?;
        let findings = page
            .findings
            .into_iter()
            .map(|finding| {
                let detector_id = mapping
                    .get(finding.monitor_id.as_str())
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                FindingDto::from_finding(finding, detector_id)
            })
            .collect();
        Ok(FindingsPage {
            total_findings: page.total_findings,
            findings,
        })
    }
}

fn monitor_to_detector(detectors: &[Detector]) -> HashMap<&str, &str> {
    detectors
        .iter()
        .flat_map(|d| d.monitor_ids.iter().map(|m| (m.as_str(), d.id.as_str())))
        .collect()
}
