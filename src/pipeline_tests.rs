// src/pipeline_tests.rs

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use crate::aggregate::{occurrence_kpis, summarize_occurrences, top_n, GroupKey};
    use crate::loader::{
        parse_attendance_csv, parse_ledger_csv, DataSource, LoaderConfig, ReportLoader,
    };
    use crate::report::DashboardReport;
    use crate::ReportError;

    const ATTENDANCE_CSV: &str = "\
Matricula,Nome,Data,Estabelecimento,Departamento,Cargo,Ocorrencia,Justificativa,Marcacoes
1001,Ana Souza,05/03/2024,A,RH,Analista,Falta,Falta,
1003,Caio Melo,05/03/2024,A,RH,Assistente,Falta,Falta,
1002,Bruno Lima,06/03/2024,B,Logística,Operador,Atraso,Ok,08:00 12:00 13:00 17:00
9999,Davi Rocha,bad date,B,Logística,Operador,Sem marcação de saída,,08:00 12:00 13:00
";

    const LEDGER_CSV: &str = "\
Matricula,Nome,Estabelecimento,Departamento,Cargo,SaldoFinal,Pagamentos,Descontos
1001,Ana Souza,A,RH,Analista,-05:30,-03:00,02:00
1002,Bruno Lima,B,Logística,Operador,02:45,00:00,garbage
1002,Bruno Lima,B,Logística,Operador,01:00,00:00,00:00
";

    #[test]
    fn end_to_end_pipeline_matches_expected_counts() {
        let attendance = parse_attendance_csv(ATTENDANCE_CSV.as_bytes(), "attendance").unwrap();
        let ledger = parse_ledger_csv(LEDGER_CSV.as_bytes(), "ledger").unwrap();

        // Establishment A holds both unexcused absences; B holds none but
        // one missing punch (which is also an odd punch, counted twice).
        let by_establishment = summarize_occurrences(&attendance, GroupKey::Establishment);
        assert_eq!(by_establishment[0].key, "A");
        assert_eq!(by_establishment[0].unexcused_absences, 2);
        assert_eq!(by_establishment[1].key, "B");
        assert_eq!(by_establishment[1].unexcused_absences, 0);
        assert_eq!(by_establishment[1].total_occurrences(), 2);

        let ranked = top_n(&by_establishment, 10, |s| s.unexcused_absences as f64);
        assert_eq!(ranked.len(), 1, "zero-count group must leave the chart");
        assert_eq!(ranked[0].key, "A");

        let kpis = occurrence_kpis(&attendance);
        assert_eq!(kpis.unexcused_absences, 2);
        assert_eq!(kpis.punch_irregularities(), 2);

        let report = DashboardReport::build(&attendance, &ledger, 10);
        // Headcount comes from the ledger roster (ids 1001, 1002), not
        // from the attendance ids (which include 1003 and 9999).
        assert_eq!(report.hour_bank.head_count, 2);
        assert_eq!(report.hour_bank.positive_balance_hours, 3.75);
        assert_eq!(report.hour_bank.negative_balance_hours, -5.5);
        // The malformed deduction cell became a silent zero debit.
        assert_eq!(report.hour_bank.deductions_hours, -2.0);
        assert_eq!(report.hour_bank.payments_hours, 3.0);
    }

    #[test]
    fn same_bytes_twice_yield_identical_reports() {
        let attendance_a = parse_attendance_csv(ATTENDANCE_CSV.as_bytes(), "a").unwrap();
        let attendance_b = parse_attendance_csv(ATTENDANCE_CSV.as_bytes(), "a").unwrap();
        let ledger_a = parse_ledger_csv(LEDGER_CSV.as_bytes(), "l").unwrap();
        let ledger_b = parse_ledger_csv(LEDGER_CSV.as_bytes(), "l").unwrap();

        assert_eq!(attendance_a, attendance_b);
        assert_eq!(ledger_a, ledger_b);
        assert_eq!(
            DashboardReport::build(&attendance_a, &ledger_a, 10),
            DashboardReport::build(&attendance_b, &ledger_b, 10)
        );
    }

    #[test]
    fn per_cell_failures_never_panic_or_propagate() {
        let csv = "\
Matricula,Nome,Data,Estabelecimento,Departamento,Cargo,Ocorrencia,Justificativa,Marcacoes
1,Ana,??,A,RH,Analista,Falta,Falta,
2,Bia,32/13/2024,A,RH,Analista,Falta,Atestado,
";
        let records = parse_attendance_csv(csv.as_bytes(), "test").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.date.is_none()));
        // Dateless rows still feed the establishment grouping.
        let by_establishment = summarize_occurrences(&records, GroupKey::Establishment);
        assert_eq!(by_establishment[0].unexcused_absences, 1);
        // But not the date grouping.
        assert!(summarize_occurrences(&records, GroupKey::Date).is_empty());
    }

    #[tokio::test]
    async fn loader_serves_cached_snapshot_until_invalidated() {
        let path = std::env::temp_dir().join(format!(
            "ponto-dashboard-cache-test-{}.csv",
            std::process::id()
        ));
        fs::write(&path, LEDGER_CSV).unwrap();

        let loader = ReportLoader::new(&LoaderConfig {
            http_timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(600),
        })
        .unwrap();
        let source = DataSource::File(path.clone());

        let first = loader.load_ledger(&source).await.unwrap();
        assert_eq!(first.len(), 3);

        // Replace the file; within the TTL the loader must keep serving
        // the snapshot it already has.
        fs::write(
            &path,
            "Matricula,Nome,Estabelecimento,Departamento,Cargo,SaldoFinal,Pagamentos,Descontos\n",
        )
        .unwrap();
        let cached = loader.load_ledger(&source).await.unwrap();
        assert_eq!(cached.len(), 3);

        // Invalidation forces a fresh read.
        loader.invalidate(&source);
        let reloaded = loader.load_ledger(&source).await.unwrap();
        assert_eq!(reloaded.len(), 0);

        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_file_is_fatal_with_source_in_error() {
        let loader = ReportLoader::new(&LoaderConfig::default()).unwrap();
        let source = DataSource::File("/definitely/not/here.csv".into());
        let err = loader.load_attendance(&source).await.unwrap_err();
        match err {
            ReportError::Io { source_id, .. } => {
                assert!(source_id.contains("not/here.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn schema_mismatch_is_fatal_at_load_time() {
        let path = std::env::temp_dir().join(format!(
            "ponto-dashboard-schema-test-{}.csv",
            std::process::id()
        ));
        fs::write(&path, "Matricula,Nome\n1,Ana\n").unwrap();

        let loader = ReportLoader::new(&LoaderConfig::default()).unwrap();
        let source = DataSource::File(path.clone());
        let err = loader.load_ledger(&source).await.unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn { .. }));

        fs::remove_file(&path).ok();
    }
}
