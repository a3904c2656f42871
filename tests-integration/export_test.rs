//! Integration tests for the schema export against a real PostgreSQL server.
//!
//! Each test starts a throwaway Postgres container, seeds a small schema and
//! runs the full export into a temp directory.
//!
//! Run with: `cargo test -p supabase-export-integration-tests -- --ignored`

use postgres::NoTls;
use std::fs;
use std::path::Path;
use supabase_export::render::normalize_generated_lines;
use supabase_export::{
    connect, DbConfig, ExportOptions, Exporter, PgCatalog, PostgresExecutor, SqlWriter,
    SslPreference, TableOrder,
};
use tempfile::TempDir;
use testcontainers::clients::Cli;
use testcontainers_modules::postgres::Postgres;

const SEED: &str = r#"
CREATE TABLE courses (
    id integer PRIMARY KEY,
    title character varying(100) NOT NULL,
    active boolean DEFAULT true
);

CREATE TABLE students (
    id integer PRIMARY KEY,
    email text NOT NULL UNIQUE,
    course_id integer REFERENCES courses (id)
);

ALTER TABLE students ENABLE ROW LEVEL SECURITY;
CREATE POLICY "Students read own row" ON students FOR SELECT TO public USING (true);
CREATE POLICY "Students insert" ON students FOR INSERT TO public WITH CHECK (true);

CREATE FUNCTION touch_course() RETURNS trigger LANGUAGE plpgsql AS $$
BEGIN
    RETURN NEW;
END;
$$;

CREATE TRIGGER courses_touch BEFORE UPDATE ON courses
    FOR EACH ROW EXECUTE FUNCTION touch_course();

CREATE VIEW active_courses AS SELECT id, title FROM courses WHERE active;

INSERT INTO courses (id, title) VALUES (1, 'Algebra'), (2, 'O''Reilly Physics');
INSERT INTO students (id, email, course_id) VALUES (10, 'a@example.com', 1);
"#;

fn db_config(port: u16) -> DbConfig {
    DbConfig {
        host: "127.0.0.1".to_string(),
        port,
        database: "postgres".to_string(),
        user: "postgres".to_string(),
        password: "postgres".to_string(),
        ssl: SslPreference::Disable,
    }
}

fn seed(port: u16) {
    let url = format!("host=127.0.0.1 port={} user=postgres password=postgres dbname=postgres", port);
    let mut client = postgres::Client::connect(&url, NoTls).expect("Failed to connect for seeding");
    client.batch_execute(SEED).expect("Failed to seed schema");
}

fn export(db: &DbConfig, out: &Path, options: ExportOptions) -> supabase_export::ExportReport {
    let client = connect(db).expect("Failed to connect");
    let catalog = PgCatalog::new(PostgresExecutor::new(client));
    let mut exporter = Exporter::new(catalog, SqlWriter::new(out), options);
    let report = exporter.run().expect("Export failed");
    exporter.into_catalog().close().expect("Failed to close connection");
    report
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[test]
#[ignore = "requires docker"]
fn test_export_public_schema() {
    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);
    seed(port);

    let db = db_config(port);
    let tmp = TempDir::new().unwrap();
    let report = export(&db, tmp.path(), ExportOptions::new("public", db.host.clone()));

    assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);
    assert_eq!(report.tables, 2);
    assert_eq!(report.policy_tables, 1);
    assert_eq!(report.policies, 2);
    assert_eq!(report.trigger_tables, 1);
    assert_eq!(report.functions, 1);
    assert_eq!(report.views, 1);

    let courses = read(&tmp.path().join("schemas/courses.sql"));
    assert!(courses.contains(
        "CREATE TABLE IF NOT EXISTS public.courses (\n  \
         id integer NOT NULL,\n  \
         title character varying(100) NOT NULL,\n  \
         active boolean DEFAULT true\n);\n"
    ));
    assert!(courses.contains("ADD CONSTRAINT courses_pkey PRIMARY KEY (id);"));

    let students = read(&tmp.path().join("schemas/students.sql"));
    assert!(students.contains("UNIQUE (email);"));
    assert!(students.contains("FOREIGN KEY (course_id) REFERENCES courses(id);"));

    let policies = read(&tmp.path().join("rls_policies/students.sql"));
    assert!(policies.contains("ALTER TABLE public.students ENABLE ROW LEVEL SECURITY;"));
    // catalog order is by policy name
    let insert_pos = policies.find("CREATE POLICY \"Students insert\"").unwrap();
    let read_pos = policies.find("CREATE POLICY \"Students read own row\"").unwrap();
    assert!(insert_pos < read_pos);

    let triggers = read(&tmp.path().join("triggers/courses.sql"));
    assert!(triggers.contains("CREATE TRIGGER courses_touch BEFORE UPDATE ON"));
    assert!(triggers.contains("EXECUTE FUNCTION touch_course()"));

    let function = read(&tmp.path().join("functions/touch_course.sql"));
    assert!(function.contains("CREATE OR REPLACE FUNCTION public.touch_course()"));

    let view = read(&tmp.path().join("views/active_courses.sql"));
    assert!(view.contains("CREATE OR REPLACE VIEW public.active_courses AS"));

    let index = read(&tmp.path().join("complete_schema/README.sql"));
    assert!(index.contains(&format!("-- Database: {}", db.host)));
}

#[test]
#[ignore = "requires docker"]
fn test_export_is_repeatable() {
    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);
    seed(port);

    let db = db_config(port);
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    export(&db, first.path(), ExportOptions::new("public", db.host.clone()));
    export(&db, second.path(), ExportOptions::new("public", db.host.clone()));

    for file in [
        "schemas/courses.sql",
        "schemas/students.sql",
        "complete_schema/all_tables.sql",
        "complete_schema/all_rls_policies.sql",
        "complete_schema/all_triggers.sql",
        "complete_schema/all_functions.sql",
        "complete_schema/all_views.sql",
    ] {
        assert_eq!(
            normalize_generated_lines(&read(&first.path().join(file))),
            normalize_generated_lines(&read(&second.path().join(file))),
            "{} differs between runs",
            file
        );
    }
}

#[test]
#[ignore = "requires docker"]
fn test_export_dependency_order_and_data() {
    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);
    seed(port);

    let db = db_config(port);
    let tmp = TempDir::new().unwrap();
    let mut options = ExportOptions::new("public", db.host.clone());
    options.table_order = TableOrder::Dependency;
    options.include_data = true;
    options.data_row_limit = 1;

    let report = export(&db, tmp.path(), options);
    assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);
    assert_eq!(report.data_tables, 2);

    let all_tables = read(&tmp.path().join("complete_schema/all_tables.sql"));
    let courses = all_tables.find("public.courses (").unwrap();
    let students = all_tables.find("public.students (").unwrap();
    assert!(courses < students);

    let data = read(&tmp.path().join("data/courses.sql"));
    assert!(data.contains("-- Rows: 1"));
    assert!(data.contains("INSERT INTO public.courses (id, title, active) VALUES (1, 'Algebra', true);"));
    assert!(tmp.path().join("data/complete/all_data.sql").is_file());
}

#[test]
#[ignore = "requires docker"]
fn test_export_empty_schema() {
    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);

    let db = db_config(port);
    let tmp = TempDir::new().unwrap();
    let report = export(&db, tmp.path(), ExportOptions::new("public", db.host.clone()));

    assert_eq!(report.tables, 0);
    let policies = read(&tmp.path().join("complete_schema/all_rls_policies.sql"));
    assert!(policies.starts_with("-- Complete RLS Policies\n-- Generated: "));
    assert_eq!(policies.lines().count(), 3);
}

const KEYS_SEED: &str = r#"
CREATE SCHEMA keys;

CREATE TABLE keys.parent (
    a integer,
    b integer,
    PRIMARY KEY (a, b)
);

CREATE TABLE keys.child (
    id integer PRIMARY KEY,
    b_id integer,
    a_id integer,
    CONSTRAINT child_parent_fkey FOREIGN KEY (b_id, a_id) REFERENCES keys.parent (b, a)
);

CREATE TABLE keys.users (id integer PRIMARY KEY);
CREATE TABLE keys.orgs (id integer PRIMARY KEY);
CREATE TABLE keys.x (o integer, CONSTRAINT fk_owner FOREIGN KEY (o) REFERENCES keys.users (id));
CREATE TABLE keys.y (o integer, CONSTRAINT fk_owner FOREIGN KEY (o) REFERENCES keys.orgs (id));
"#;

#[test]
#[ignore = "requires docker"]
fn test_export_foreign_key_columns_and_targets() {
    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);

    let url = format!("host=127.0.0.1 port={} user=postgres password=postgres dbname=postgres", port);
    let mut client = postgres::Client::connect(&url, NoTls).expect("Failed to connect for seeding");
    client.batch_execute(KEYS_SEED).expect("Failed to seed schema");

    let db = db_config(port);
    let tmp = TempDir::new().unwrap();
    let report = export(&db, tmp.path(), ExportOptions::new("keys", db.host.clone()));
    assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);

    let parent = read(&tmp.path().join("schemas/parent.sql"));
    assert!(parent.contains("ALTER TABLE keys.parent ADD CONSTRAINT parent_pkey PRIMARY KEY (a, b);"));

    let child = read(&tmp.path().join("schemas/child.sql"));
    assert!(child.contains(
        "ALTER TABLE keys.child ADD CONSTRAINT child_parent_fkey FOREIGN KEY (b_id, a_id) REFERENCES parent(b, a);"
    ));

    let x = read(&tmp.path().join("schemas/x.sql"));
    assert!(x.contains("ALTER TABLE keys.x ADD CONSTRAINT fk_owner FOREIGN KEY (o) REFERENCES users(id);"));
    let y = read(&tmp.path().join("schemas/y.sql"));
    assert!(y.contains("ALTER TABLE keys.y ADD CONSTRAINT fk_owner FOREIGN KEY (o) REFERENCES orgs(id);"));
}

const DOCS_SEED: &str = r#"
CREATE TABLE docs (
    id integer PRIMARY KEY,
    body jsonb,
    tags text[],
    note text
);

INSERT INTO docs (id, body, tags, note) VALUES
    (1, '42', ARRAY['a', 'b''c'], 'it''s'),
    (2, '"abc"', ARRAY[]::text[], NULL),
    (3, 'true', NULL, 'x'),
    (4, '{"k": [1, "two"]}', ARRAY['z'], 'y');
"#;

const DOCS_SNAPSHOT: &str =
    "SELECT id, body::text, tags::text, note FROM docs ORDER BY id";

type DocRow = (i32, Option<String>, Option<String>, Option<String>);

fn docs_snapshot(client: &mut postgres::Client) -> Vec<DocRow> {
    client
        .query(DOCS_SNAPSHOT, &[])
        .expect("Failed to read docs")
        .iter()
        .map(|row| (row.get(0), row.get(1), row.get(2), row.get(3)))
        .collect()
}

#[test]
#[ignore = "requires docker"]
fn test_exported_data_applies_back() {
    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);

    let url = format!("host=127.0.0.1 port={} user=postgres password=postgres dbname=postgres", port);
    let mut client = postgres::Client::connect(&url, NoTls).expect("Failed to connect for seeding");
    client.batch_execute(DOCS_SEED).expect("Failed to seed schema");
    let before = docs_snapshot(&mut client);

    let db = db_config(port);
    let tmp = TempDir::new().unwrap();
    let mut options = ExportOptions::new("public", db.host.clone());
    options.include_data = true;
    let report = export(&db, tmp.path(), options);
    assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);

    let data = read(&tmp.path().join("data/docs.sql"));
    client.batch_execute("TRUNCATE docs").expect("Failed to truncate");
    client.batch_execute(&data).expect("Exported INSERTs did not apply");

    assert_eq!(docs_snapshot(&mut client), before);
}
