use std::path::Path;
use std::sync::Arc;

use tripleops_core::{FormatSpec, LoadStrategy, Notation, ResultCode};
use tripleops_engine::{
    CacheInfo, LoadedStore, Operation, OperationRunner, PlainBackend, TriplePattern,
};
use tripleops_logging::{op_info, op_warn};

use crate::cli::Command;
use crate::surface::TerminalSurface;

/// Runs one CLI command as a chain of operations, stopping at the first run
/// that does not succeed. Returns the code of the last run.
pub struct Session {
    runner: OperationRunner<PlainBackend>,
    strategy: LoadStrategy,
    surface: TerminalSurface,
}

impl Session {
    pub fn new(
        runner: OperationRunner<PlainBackend>,
        strategy: LoadStrategy,
        surface: TerminalSurface,
    ) -> Self {
        Self {
            runner,
            strategy,
            surface,
        }
    }

    pub fn execute(&mut self, command: Command) -> ResultCode {
        match command {
            Command::Load { container } => match self.load(&container) {
                Ok(loaded) => {
                    print_summary(&container, &loaded);
                    ResultCode::Success
                }
                Err(code) => code,
            },
            Command::Import {
                input,
                output,
                notation,
                base,
                spec,
            } => {
                let notation = resolve_notation(notation, &input);
                let spec = spec.unwrap_or_default();
                let imported = match self.import(&input, notation, spec, &base) {
                    Ok(imported) => imported,
                    Err(code) => return code,
                };
                let report = self.runner.run(
                    Operation::save_container(Arc::new(imported.store), &output),
                    &mut self.surface,
                );
                report.code
            }
            Command::Export {
                container,
                output,
                notation,
            } => {
                let loaded = match self.load(&container) {
                    Ok(loaded) => loaded,
                    Err(code) => return code,
                };
                let notation = resolve_notation(notation, &output);
                let report = self.runner.run(
                    Operation::export_exchange(Arc::new(loaded.store), &output, notation),
                    &mut self.surface,
                );
                report.code
            }
            Command::Query {
                container,
                output,
                subject,
                predicate,
                object,
                notation,
            } => {
                let loaded = match self.load(&container) {
                    Ok(loaded) => loaded,
                    Err(code) => return code,
                };
                let pattern = TriplePattern {
                    subject,
                    predicate,
                    object,
                };
                let (cursor, count) = self.runner.backend().search(&loaded.store, &pattern);
                println!("{count} matching triples");
                let notation = resolve_notation(notation, &output);
                let report = self.runner.run(
                    Operation::export_query_results(cursor, count, &output, notation),
                    &mut self.surface,
                );
                report.code
            }
        }
    }

    fn load(&mut self, container: &Path) -> Result<LoadedStore<PlainBackend>, ResultCode> {
        let report = self.runner.run(
            Operation::load_container_with(container, self.strategy),
            &mut self.surface,
        );
        let code = report.code;
        report.into_loaded().ok_or(code)
    }

    fn import(
        &mut self,
        input: &Path,
        notation: Notation,
        spec: FormatSpec,
        base: &str,
    ) -> Result<LoadedStore<PlainBackend>, ResultCode> {
        let report = self.runner.run(
            Operation::import_exchange(input, notation, spec, base),
            &mut self.surface,
        );
        let code = report.code;
        report.into_loaded().ok_or(code)
    }
}

fn resolve_notation(explicit: Option<Notation>, path: &Path) -> Notation {
    if let Some(notation) = explicit {
        return notation;
    }
    match Notation::from_path(path) {
        Some(notation) => {
            op_info!("notation {} guessed from {}", notation, path.display());
            notation
        }
        None => {
            op_warn!(
                "cannot tell the notation of {}, assuming {}",
                path.display(),
                Notation::NTriples
            );
            Notation::NTriples
        }
    }
}

fn print_summary(container: &Path, loaded: &LoadedStore<PlainBackend>) {
    println!("{}", container.display());
    println!("  triples:       {}", loaded.store.len());
    if let Some(base) = loaded.store.base_id() {
        println!("  base:          {base}");
    }
    print_cache(&loaded.cache);
}

fn print_cache(cache: &CacheInfo) {
    if let Some(stats) = &cache.statistics {
        println!("  subjects:      {}", stats.distinct_subjects);
        println!("  predicates:    {}", stats.distinct_predicates);
        println!("  objects:       {}", stats.distinct_objects);
        println!("  shared s/o:    {}", stats.shared_subject_objects);
    }
    if let Some(matrix) = &cache.relation_matrix {
        for row in matrix {
            println!(
                "  {}  {} triples, {} subjects, {} objects",
                row.predicate, row.triples, row.distinct_subjects, row.distinct_objects
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use tripleops_engine::RunnerConfig;

    use super::*;

    fn session() -> Session {
        Session::new(
            OperationRunner::new(Arc::new(PlainBackend::new()), RunnerConfig::default()),
            LoadStrategy::default(),
            TerminalSurface::new(false),
        )
    }

    #[test]
    fn notation_falls_back_to_ntriples() {
        assert_eq!(
            resolve_notation(None, Path::new("dump.ttl.gz")),
            Notation::Turtle
        );
        assert_eq!(resolve_notation(None, Path::new("dump.bin")), Notation::NTriples);
        assert_eq!(
            resolve_notation(Some(Notation::NQuads), Path::new("dump.nt")),
            Notation::NQuads
        );
    }

    #[test]
    fn import_then_query_chains_runs() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.nt");
        fs::write(
            &input,
            "<http://a/s> <http://a/p> <http://a/o> .\n<http://a/s> <http://a/q> \"x\" .\n",
        )
        .unwrap();
        let container = temp.path().join("store.hdt");
        let hits = temp.path().join("hits.nt");
        let mut session = session();

        let code = session.execute(Command::Import {
            input,
            output: container.clone(),
            notation: None,
            base: String::new(),
            spec: None,
        });
        assert_eq!(code, ResultCode::Success);
        assert!(container.is_file());

        let code = session.execute(Command::Query {
            container,
            output: hits.clone(),
            subject: None,
            predicate: Some("<http://a/q>".to_string()),
            object: None,
            notation: None,
        });
        assert_eq!(code, ResultCode::Success);
        assert_eq!(
            fs::read_to_string(&hits).unwrap(),
            "<http://a/s> <http://a/q> \"x\" .\n"
        );
    }

    #[test]
    fn failed_load_stops_the_chain() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.nt");
        let code = session().execute(Command::Export {
            container: temp.path().join("missing.hdt"),
            output: output.clone(),
            notation: None,
        });
        assert_eq!(code, ResultCode::Failure);
        assert!(!output.exists());
    }
}
