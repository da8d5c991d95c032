//! SQL Server catalog queries.
//!
//! Column aliases match the source columns declared in the descriptor
//! mapping tables in [`types`](super::types).

pub const SCHEMAS: &str = r#"
    SELECT s.schema_id, s.name
    FROM sys.schemas AS s
    WHERE s.name NOT IN ('sys', 'INFORMATION_SCHEMA', 'guest')
      AND s.name NOT LIKE 'db[_]%'
    ORDER BY s.schema_id
"#;

pub const PROCEDURES: &str = r#"
    SELECT p.object_id, p.schema_id, p.name, p.modify_date
    FROM sys.procedures AS p
    WHERE p.is_ms_shipped = 0
    ORDER BY p.schema_id, p.object_id
"#;

pub const INPUTS: &str = r#"
    SELECT
        par.object_id,
        par.parameter_id,
        STUFF(par.name, 1, 1, '') AS name,
        par.is_nullable,
        TYPE_NAME(t.system_type_id) AS system_type_name,
        par.max_length,
        par.is_output,
        t.is_table_type,
        CASE WHEN t.is_user_defined = 1 THEN t.name END AS user_type_name,
        CASE WHEN t.is_user_defined = 1 THEN t.user_type_id END AS user_type_id,
        CASE WHEN t.is_user_defined = 1 THEN SCHEMA_NAME(t.schema_id) END AS user_type_schema
    FROM sys.parameters AS par
    JOIN sys.types AS t ON t.user_type_id = par.user_type_id
    JOIN sys.procedures AS p ON p.object_id = par.object_id
    WHERE p.is_ms_shipped = 0 AND par.parameter_id > 0
    ORDER BY par.object_id, par.parameter_id
"#;

pub const RESULT_COLUMNS: &str = r#"
    SELECT
        p.object_id,
        1 AS result_set_ordinal,
        r.column_ordinal,
        r.name,
        r.is_nullable,
        r.system_type_name,
        r.max_length,
        r.collation_name,
        CASE WHEN r.name = 'JSON_F52E2B61-18A1-11d1-B105-00805F49916B' THEN 1 ELSE 0 END AS returns_json,
        CASE WHEN r.name = 'JSON_F52E2B61-18A1-11d1-B105-00805F49916B' THEN 1 ELSE 0 END AS returns_json_array
    FROM sys.procedures AS p
    CROSS APPLY sys.dm_exec_describe_first_result_set_for_object(p.object_id, 0) AS r
    WHERE p.is_ms_shipped = 0 AND r.is_hidden = 0 AND r.error_number IS NULL
    ORDER BY p.object_id, r.column_ordinal
"#;

pub const TABLE_TYPE_COLUMNS: &str = r#"
    SELECT
        tt.user_type_id,
        c.column_id,
        c.name,
        c.is_nullable,
        TYPE_NAME(c.system_type_id) AS system_type_name,
        c.max_length
    FROM sys.table_types AS tt
    JOIN sys.columns AS c ON c.object_id = tt.type_table_object_id
    ORDER BY tt.user_type_id, c.column_id
"#;
