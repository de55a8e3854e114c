use std::fmt;

/// The five long-running operations the runner knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    LoadContainer,
    ImportExchangeFormat,
    SaveContainer,
    ExportExchangeFormat,
    ExportQueryResults,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::LoadContainer,
        OperationKind::ImportExchangeFormat,
        OperationKind::SaveContainer,
        OperationKind::ExportExchangeFormat,
        OperationKind::ExportQueryResults,
    ];

    /// Title shown on the progress surface while this kind runs.
    pub fn title(self) -> &'static str {
        match self {
            OperationKind::LoadContainer => "Loading Container",
            OperationKind::ImportExchangeFormat => "Importing RDF Into Container",
            OperationKind::SaveContainer => "Saving Container",
            OperationKind::ExportExchangeFormat => "Exporting Container to RDF",
            OperationKind::ExportQueryResults => "Exporting Results to RDF",
        }
    }

    /// Label of the final 100% tick emitted on success.
    pub fn completion_label(self) -> &'static str {
        match self {
            OperationKind::LoadContainer => "Container loaded",
            OperationKind::ImportExchangeFormat => "Import complete",
            OperationKind::SaveContainer => "Container saved",
            OperationKind::ExportExchangeFormat | OperationKind::ExportQueryResults => {
                "Export complete"
            }
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::LoadContainer => "load-container",
            OperationKind::ImportExchangeFormat => "import-exchange",
            OperationKind::SaveContainer => "save-container",
            OperationKind::ExportExchangeFormat => "export-exchange",
            OperationKind::ExportQueryResults => "export-results",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_distinct_title() {
        let mut titles: Vec<_> = OperationKind::ALL.iter().map(|k| k.title()).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), OperationKind::ALL.len());
    }
}
