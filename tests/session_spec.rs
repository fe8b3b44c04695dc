use std::fs;

use cane_harvest::config::AppConfig;
use cane_harvest::models::*;
use cane_harvest::session::{DeleteTarget, Session};
use cane_harvest::shell;
use cane_harvest::store::{
    ConnectionSettings, ExportOutcome, RelationalStore, SchemaStatus, SqliteConnector,
};
use cane_harvest::Error;
use speculate2::speculate;
use tempfile::TempDir;

fn a1() -> NewHarvest {
    NewHarvest {
        plot_name: "A1".to_string(),
        area_ha: 10.0,
        yield_t_per_ha: 5.0,
        method: HarvestMethod::Manual,
        price_per_ton: 100.0,
    }
}

fn b2() -> NewHarvest {
    NewHarvest {
        plot_name: "B2".to_string(),
        area_ha: 8.0,
        yield_t_per_ha: 6.0,
        method: HarvestMethod::Mechanized,
        price_per_ton: 120.0,
    }
}

fn run_script(session: &mut Session, script: &str) -> String {
    let mut out = Vec::new();
    shell::run(session, script.as_bytes(), &mut out, false).expect("Shell failed");
    String::from_utf8(out).expect("Shell output is UTF-8")
}

speculate! {
    describe "session with a reachable database" {
        before {
            let dir = TempDir::new().expect("Failed to create temp dir");
            let config = AppConfig {
                data_dir: dir.path().join("data"),
                ..AppConfig::default()
            };
            let settings = ConnectionSettings::new(
                "farm",
                "secret",
                dir.path().join("cane.db").to_string_lossy(),
            );
            let mut session = Session::new(&config, RelationalStore::new(SqliteConnector::new(settings)));
        }

        describe "register" {
            it "computes the manual scenario" {
                let record = session.register(a1()).expect("Failed to register");

                assert_eq!(record.total_tons(), 50.0);
                assert_eq!(record.loss_pct(), 5.0);
                assert_eq!(record.loss_tons(), 2.5);
                assert_eq!(record.loss_cost(), 250.0);
            }

            it "computes the mechanized scenario" {
                let record = session.register(b2()).expect("Failed to register");

                assert_eq!(record.total_tons(), 48.0);
                assert_eq!(record.loss_pct(), 15.0);
                assert_eq!(record.loss_tons(), 7.2);
                assert_eq!(record.loss_cost(), 864.0);
            }

            it "leaves the ledger untouched on invalid input" {
                let mut bad = a1();
                bad.area_ha = 0.0;

                assert!(matches!(session.register(bad), Err(Error::InvalidInput(_))));
                assert!(session.ledger().is_empty());
            }

            it "writes an event log line" {
                let id = session.register(a1()).expect("Failed to register").id();

                let log = fs::read_to_string(config.log_path()).expect("Log missing");
                assert!(log.starts_with('['));
                assert!(log.contains(&format!("] Registered harvest {} (A1)", id)));
            }
        }

        describe "summary" {
            it "totals both scenarios" {
                session.register(a1()).expect("Failed to register");
                session.register(b2()).expect("Failed to register");

                assert_eq!(
                    session.summary(),
                    LossSummary { total_tons: 98.0, loss_tons: 9.7, loss_cost: 1114.0 }
                );
            }
        }

        describe "remove_local" {
            it "keeps the record that was second" {
                session.register(a1()).expect("Failed to register");
                let second = session.register(b2()).expect("Failed to register").clone();

                session.remove_local(1).expect("Failed to remove");

                assert_eq!(session.ledger().records(), &[second]);
            }
        }

        describe "file round trip" {
            it "reloads exactly what was saved" {
                session.register(a1()).expect("Failed to register");
                session.register(b2()).expect("Failed to register");
                let saved = session.ledger().clone();

                assert_eq!(session.save_file().expect("Failed to save"), 2);
                session.remove_local(1).expect("Failed to remove");
                assert_eq!(session.load_file().expect("Failed to load"), 2);

                assert_eq!(session.ledger(), &saved);
            }

            it "keeps the ledger when the document is malformed" {
                session.register(a1()).expect("Failed to register");
                fs::create_dir_all(&config.data_dir).unwrap();
                fs::write(config.ledger_path(), "{ not a ledger").unwrap();

                assert!(session.load_file().is_err());
                assert_eq!(session.ledger().len(), 1);
            }

            it "refuses to save over a document that failed to load" {
                fs::create_dir_all(&config.data_dir).unwrap();
                let hand_edited = r#"[{"id":"x","hand":"edited"}]"#;
                fs::write(config.ledger_path(), hand_edited).unwrap();

                assert!(matches!(session.load_file(), Err(Error::MalformedDocument { .. })));
                session.register(a1()).expect("Failed to register");

                assert!(matches!(session.save_file(), Err(Error::UnreadableDocument(_))));
                assert_eq!(fs::read_to_string(config.ledger_path()).unwrap(), hand_edited);

                assert_eq!(session.overwrite_file().expect("Failed to overwrite"), 1);
                assert_eq!(session.save_file().expect("Failed to save"), 1);
            }

            it "saves again once the document loads" {
                fs::create_dir_all(&config.data_dir).unwrap();
                fs::write(config.ledger_path(), "{ not a ledger").unwrap();
                assert!(session.load_file().is_err());

                fs::write(config.ledger_path(), "[]").unwrap();
                assert_eq!(session.load_file().expect("Failed to load"), 0);
                assert!(!session.document_unreadable());
                assert_eq!(session.save_file().expect("Failed to save"), 0);
            }
        }

        describe "relational synchronization" {
            before {
                assert_eq!(session.create_table().expect("Failed"), SchemaStatus::Created);
            }

            it "exports and imports the ledger" {
                session.register(a1()).expect("Failed to register");
                session.register(b2()).expect("Failed to register");
                let exported = session.ledger().clone();

                assert!(matches!(
                    session.export().expect("Failed to export"),
                    ExportOutcome::Upserted { records: 2, .. }
                ));

                session.remove_local(1).expect("Failed to remove");
                session.remove_local(1).expect("Failed to remove");
                assert_eq!(session.import_table().expect("Failed to import"), 2);

                for record in exported.iter() {
                    assert_eq!(session.ledger().find(record.id()), Some(record));
                }
            }

            it "reports nothing to export for an empty ledger" {
                assert_eq!(session.export().expect("Failed"), ExportOutcome::NothingToExport);
            }

            it "deletes by id, by position and all at once" {
                let first = session.register(a1()).expect("Failed").id();
                session.register(b2()).expect("Failed");
                session.register(a1()).expect("Failed");
                session.export().expect("Failed to export");

                assert_eq!(session.delete_from_table(DeleteTarget::Id(first)).expect("Failed"), 1);
                assert_eq!(session.delete_from_table(DeleteTarget::Id(first)).expect("Failed"), 0);
                assert_eq!(session.delete_from_table(DeleteTarget::Position(1)).expect("Failed"), 1);
                assert!(matches!(
                    session.delete_from_table(DeleteTarget::Position(5)),
                    Err(Error::IndexOutOfRange { position: 5, len: 1 })
                ));
                assert_eq!(session.clear_table().expect("Failed"), 1);
                assert!(session.query_table().expect("Failed").is_empty());

                // Deleting stored rows never touches the ledger.
                assert_eq!(session.ledger().len(), 3);
            }
        }

        describe "shell" {
            it "runs a full session script" {
                let output = run_script(&mut session, "\
                    register 10 5 manual 100 A1\n\
                    register 8 6 Mechanized 120 B2\n\
                    summary\n\
                    save\n\
                    delete 1\n\
                    list\n\
                    exit\n\
                    list\n");

                assert!(output.contains("Registered A1: 50.00 t harvested, 2.50 t lost (5.00%), loss cost R$ 250,00"));
                assert!(output.contains("Registered B2: 48.00 t harvested, 7.20 t lost (15.00%), loss cost R$ 864,00"));
                assert!(output.contains("Total produced (t): 98.00"));
                assert!(output.contains("Total lost     (t): 9.70"));
                assert!(output.contains("R$ 1.114,00"));
                assert!(output.contains("Saved 2 record(s)"));
                assert!(output.contains("Removed record #1 (A1)."));
                assert!(output.contains("Record #1 – B2"));
                // Nothing after exit runs.
                assert_eq!(output.matches("Record #1 – B2").count(), 1);
                assert_eq!(session.ledger().len(), 1);
            }

            it "keeps going after bad commands" {
                let output = run_script(&mut session, "\
                    register 10 5 hand 100 A1\n\
                    delete 4\n\
                    frobnicate\n\
                    register 10 5 manual 100 A1\n");

                assert!(output.contains("error: position 4 is out of range"));
                assert_eq!(session.ledger().len(), 1);
            }

            it "keeps an unreadable document until save --force" {
                fs::create_dir_all(&config.data_dir).unwrap();
                fs::write(config.ledger_path(), "{ not a ledger").unwrap();

                let output = run_script(&mut session, "\
                    load\n\
                    register 10 5 manual 100 A1\n\
                    save\n");
                assert!(output.contains("error: malformed ledger document"));
                assert!(output.contains("error: refusing to overwrite"));
                assert_eq!(fs::read_to_string(config.ledger_path()).unwrap(), "{ not a ledger");

                let output = run_script(&mut session, "save --force\n");
                assert!(output.contains("Saved 1 record(s)"));
            }

            it "handles plot names with spaces" {
                run_script(&mut session, "register 2,5 80 manual 130 North Field 3\n");
                assert_eq!(session.ledger().records()[0].plot_name(), "North Field 3");
                assert_eq!(session.ledger().records()[0].area_ha(), 2.5);
            }
        }
    }

    describe "session with an unreachable database" {
        before {
            let dir = TempDir::new().expect("Failed to create temp dir");
            let config = AppConfig {
                data_dir: dir.path().join("data"),
                ..AppConfig::default()
            };
            let unreachable = ConnectionSettings::new(
                "farm",
                "secret",
                dir.path().join("missing").join("cane.db").to_string_lossy(),
            );
            let mut session = Session::new(&config, RelationalStore::new(SqliteConnector::new(unreachable)));
        }

        it "reports the database as unavailable and keeps file features working" {
            session.register(a1()).expect("Failed to register");

            assert!(matches!(session.create_table(), Err(Error::ConnectionUnavailable(_))));
            assert!(matches!(session.export(), Err(Error::ConnectionUnavailable(_))));

            assert_eq!(session.save_file().expect("Failed to save"), 1);
            assert_eq!(session.ledger().len(), 1);
        }

        it "prints the failure in the shell and continues" {
            let output = run_script(&mut session, "db-create\nregister 10 5 manual 100 A1\nsummary\n");

            assert!(output.contains("error: relational store unavailable"));
            assert!(output.contains("Total produced (t): 50.00"));
        }
    }

    describe "session without database settings" {
        before {
            for var in ["CANE_DB_USER", "CANE_DB_PASSWORD", "CANE_DB_DSN"] {
                std::env::remove_var(var);
            }
            let dir = TempDir::new().expect("Failed to create temp dir");
            let config = AppConfig {
                data_dir: dir.path().join("data"),
                ..AppConfig::default()
            };
            let mut session = Session::from_config(&config);
        }

        it "fails relational actions and keeps the ledger usable" {
            session.register(a1()).expect("Failed to register");

            match session.create_table() {
                Err(Error::ConnectionUnavailable(msg)) => assert!(msg.contains("CANE_DB_DSN")),
                other => panic!("expected ConnectionUnavailable, got {:?}", other),
            }
            assert!(matches!(session.query_table(), Err(Error::ConnectionUnavailable(_))));
            assert_eq!(session.save_file().expect("Failed to save"), 1);
        }
    }
}
