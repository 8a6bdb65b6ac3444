// ==========================================
// 导入引擎集成测试
// ==========================================
// 职责: 验证 CSV 导入的查找或创建、歧义拒绝、面积更新与计数
// ==========================================


#[cfg(test)]
mod import_engine_test {
    use field_mgmt::config::{config_keys, ConfigManager, DefaultImportConfig};
    use field_mgmt::domain::{Farm, Grower};
    use field_mgmt::importer::{FieldImporter, ImportError};
    use field_mgmt::logging;
    use field_mgmt::repository::EntityRepository;
    use std::sync::Arc;

    use crate::test_helpers::{create_test_db, import_csv, open_shared, write_csv_file, TestRepos};

    fn setup() -> (tempfile::NamedTempFile, TestRepos, FieldImporter<DefaultImportConfig>) {
        logging::init_test();
        let (temp_file, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        let repos = TestRepos::new(conn.clone());
        let importer = FieldImporter::from_connection(conn, DefaultImportConfig);
        (temp_file, repos, importer)
    }

    // ==========================================
    // 新建链路
    // ==========================================

    #[test]
    fn test_two_rows_create_one_grower_one_farm_two_fields() {
        let (_tmp, repos, importer) = setup();
        let text = import_csv(&[
            r#""Acme","North","F1","12.5""#,
            r#""Acme","North","F2","8.0""#,
        ]);

        let report = importer.import_text(&text).unwrap();

        assert_eq!(report.records_read, 2);
        assert_eq!(report.records_processed, 2);
        assert!(report.success, "unexpected errors: {:?}", report.errors);
        assert!(report.errors.is_empty());

        let growers = repos.growers.list(None).unwrap();
        assert_eq!(growers.len(), 1);
        assert_eq!(growers[0].name, "Acme");

        let farms = repos.farms.list(Some(growers[0].id)).unwrap();
        assert_eq!(farms.len(), 1);
        assert_eq!(farms[0].name, "North");

        let fields = repos.fields.list(Some(farms[0].id)).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "F1");
        assert_eq!(fields[0].area, Some(12.5));
        assert_eq!(fields[1].name, "F2");
        assert_eq!(fields[1].area, Some(8.0));
    }

    #[test]
    fn test_small_area_on_existing_field_is_rejected() {
        let (_tmp, repos, importer) = setup();
        let text = import_csv(&[
            r#""Acme","North","F1","12.5""#,
            r#""Acme","North","F2","8.0""#,
            r#""Acme","North","F1","0.00001""#,
        ]);

        let report = importer.import_text(&text).unwrap();

        assert_eq!(report.records_read, 3);
        assert_eq!(report.records_processed, 2);
        assert!(!report.success);
        assert_eq!(
            report.errors,
            vec!["Row 3: area: Area must be at least 0.0001 acres."]
        );

        // F1 保持首行面积，未被覆写
        let f1 = repos.fields.find_by_name(None, "F1").unwrap();
        assert_eq!(f1.len(), 1);
        assert_eq!(f1[0].area, Some(12.5));
        assert_eq!(f1[0].version, 1);
    }

    // ==========================================
    // 已存在实体
    // ==========================================

    #[test]
    fn test_reimport_updates_area_without_new_entities() {
        let (_tmp, repos, importer) = setup();
        let (_, _, field) = repos.seed_chain("Acme", "North", "F1", 12.5);

        let report = importer
            .import_text(&import_csv(&["Acme,North,F1,20.75"]))
            .unwrap();

        assert!(report.success);
        assert_eq!(report.records_processed, 1);
        assert_eq!(repos.growers.list(None).unwrap().len(), 1);
        assert_eq!(repos.farms.list(None).unwrap().len(), 1);

        let updated = repos.fields.find_by_id(field.id).unwrap().unwrap();
        assert_eq!(updated.area, Some(20.75));
        assert_eq!(updated.version, field.version + 1);
        assert!(updated.updated_at >= field.updated_at);
        assert_eq!(updated.created_at, field.created_at);
    }

    #[test]
    fn test_same_farm_name_under_different_growers() {
        let (_tmp, repos, importer) = setup();
        let text = import_csv(&["Acme,North,F1,1.0", "Bolt,North,F1,2.0"]);

        let report = importer.import_text(&text).unwrap();

        assert!(report.success);
        assert_eq!(repos.growers.list(None).unwrap().len(), 2);
        assert_eq!(repos.farms.list(None).unwrap().len(), 2);
        assert_eq!(repos.fields.list(None).unwrap().len(), 2);
    }

    // ==========================================
    // 歧义
    // ==========================================

    #[test]
    fn test_ambiguous_farm_rejects_row_and_creates_nothing() {
        let (_tmp, repos, importer) = setup();
        let grower = repos.growers.insert(Grower::new("Acme")).unwrap();
        repos.farms.insert(Farm::new("North", grower.id)).unwrap();
        repos.farms.insert(Farm::new("North", grower.id)).unwrap();

        let text = import_csv(&["Acme,North,F1,1.0", "Acme,South,F2,2.0"]);
        let report = importer.import_text(&text).unwrap();

        assert_eq!(report.records_read, 2);
        assert_eq!(report.records_processed, 1);
        assert!(!report.success);
        assert_eq!(
            report.errors,
            vec!["Row 1: Multiple farms named 'North' exist for grower 'Acme'"]
        );

        assert!(repos.fields.find_by_name(None, "F1").unwrap().is_empty());
        assert_eq!(repos.farms.list(Some(grower.id)).unwrap().len(), 3);
    }

    #[test]
    fn test_ambiguous_field_is_not_updated() {
        let (_tmp, repos, importer) = setup();
        let (_, _, first) = repos.seed_chain("Acme", "North", "F1", 5.0);
        let (_, _, second) = repos.seed_chain("Acme", "North", "F1", 6.0);

        let report = importer
            .import_text(&import_csv(&["Acme,North,F1,9.0"]))
            .unwrap();

        assert_eq!(report.records_processed, 0);
        assert_eq!(
            report.errors,
            vec!["Row 1: Multiple fields named 'F1' exist for farm 'North'"]
        );
        assert_eq!(repos.fields.find_by_id(first.id).unwrap().unwrap().area, Some(5.0));
        assert_eq!(repos.fields.find_by_id(second.id).unwrap().unwrap().area, Some(6.0));
    }

    // ==========================================
    // 表头预检
    // ==========================================

    #[test]
    fn test_each_missing_column_reported() {
        let (_tmp, repos, importer) = setup();

        let report = importer.import_text("grower_name,farm_name\nAcme,North\n").unwrap();

        assert!(!report.success);
        assert_eq!(report.records_read, 0);
        assert_eq!(report.records_processed, 0);
        assert_eq!(
            report.errors,
            vec![
                "Missing required column: field_name",
                "Missing required column: area"
            ]
        );
        assert!(repos.growers.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_empty_payload_reports_all_columns() {
        let (_tmp, _repos, importer) = setup();
        let report = importer.import_text("").unwrap();
        assert_eq!(report.errors.len(), 4);
        assert!(!report.success);
    }

    // ==========================================
    // 行级校验
    // ==========================================

    #[test]
    fn test_row_errors_accumulate_in_order() {
        let (_tmp, repos, importer) = setup();
        let text = import_csv(&[
            "Acme,North,F1,abc",
            "Acme,North,,3.0",
            "Acme,North,F3,",
            "Acme,North,F4,4.0",
        ]);

        let report = importer.import_text(&text).unwrap();

        assert_eq!(report.records_read, 4);
        assert_eq!(report.records_processed, 1);
        assert_eq!(
            report.errors,
            vec![
                "Row 1: area: 'abc' value must be a float.",
                "Row 2: name: This field cannot be blank.",
                "Row 3: area: This field cannot be null.",
            ]
        );
        assert_eq!(repos.fields.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_records_read_never_below_processed() {
        let (_tmp, _repos, importer) = setup();
        let text = import_csv(&["Acme,North,F1,1", ",North,F2,1", "Acme,North,F3,0"]);

        let report = importer.import_text(&text).unwrap();

        assert!(report.records_read >= report.records_processed);
        assert_eq!(report.records_read, 3);
        assert_eq!(report.records_processed, 1);
    }

    // ==========================================
    // 可选种植户列
    // ==========================================

    #[test]
    fn test_optional_grower_columns_applied_on_create() {
        let (_tmp, repos, importer) = setup();
        let text = "grower_name,farm_name,field_name,area,city,state,country\n\
                    Acme,North,F1,1.5,Fresno,CA,\n";

        let report = importer.import_text(text).unwrap();
        assert!(report.success, "errors: {:?}", report.errors);

        let grower = repos.growers.find_by_name(None, "Acme").unwrap().pop().unwrap();
        assert_eq!(grower.city.as_deref(), Some("Fresno"));
        assert_eq!(grower.state.as_deref(), Some("CA"));
        assert_eq!(grower.country, None);
    }

    // ==========================================
    // 配置 / 文件
    // ==========================================

    #[test]
    fn test_configured_delimiter_is_used() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());
        config.set_config_value(config_keys::IMPORT_DELIMITER, ";").unwrap();

        let importer = FieldImporter::from_connection(conn.clone(), config);
        let report = importer
            .import_text("grower_name;farm_name;field_name;area\nAcme;North;F1;2.5\n")
            .unwrap();

        assert!(report.success, "errors: {:?}", report.errors);
        let repos = TestRepos::new(conn);
        assert_eq!(repos.fields.list(None).unwrap()[0].area, Some(2.5));
    }

    #[test]
    fn test_import_csv_file() {
        let (_tmp, repos, importer) = setup();
        let file = write_csv_file(&import_csv(&["Acme,North,F1,12.5", "Acme,North,F2,8.0"]));

        let report = importer.import_file(file.path()).unwrap();

        assert!(report.success);
        assert_eq!(report.records_processed, 2);
        assert_eq!(repos.fields.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_batch_error() {
        let (_tmp, _repos, importer) = setup();
        let result = importer.import_file("/nonexistent/fields.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
