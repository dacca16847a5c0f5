//! End-to-end config loading from files on disk

#![allow(clippy::unwrap_used, clippy::panic)]

use lohup_config::{Config, Error, Hook, HookPhase, LoadOptions, Profile, Repository};
use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("repo.key"), "hunter2\n").unwrap();
        fs::write(dir.path().join("s3.id"), "AKIA\n").unwrap();
        fs::write(dir.path().join("s3.secret"), "shh\n").unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `lohup.toml`, with `@KEYS@` replaced by the fixture directory
    fn write(&self, content: &str) -> PathBuf {
        let file = self.path().join("lohup.toml");
        let content = content.replace("@KEYS@", &self.path().display().to_string());
        fs::write(&file, content).unwrap();
        file
    }

    fn load(&self, content: &str) -> lohup_config::Result<Config> {
        Config::load_with(self.write(content), LoadOptions::default())
    }
}

/// Message of the aggregated report behind a config error
fn cause(err: &Error) -> String {
    assert!(matches!(err, Error::Config(_)), "unexpected error: {err:?}");
    err.source().unwrap().to_string()
}

#[test]
fn test_globals_only_has_no_repositories() {
    let fixture = Fixture::new();
    let err = fixture
        .load(
            r#"
[settings.globals]
HOST = "nas"
"#,
        )
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to parse TOML config");
    assert_eq!(cause(&err), "no repositories defined");
}

#[test]
fn test_unknown_hook_kind_is_the_only_error() {
    let fixture = Fixture::new();
    let err = fixture
        .load(
            r#"
[repos.disk]
kind = "local"
path = "/srv/restic"
repo-key-file = "@KEYS@/repo.key"

[[hooks.before-all]]
kind = "unknown"

[profiles.etc]
paths = ["/etc"]
"#,
        )
        .unwrap_err();

    assert_eq!(cause(&err), "hook: Unsupported before-all: unknown");
}

#[test]
fn test_full_config() {
    let fixture = Fixture::new();
    let config = fixture
        .load(
            r#"
[settings]
backup-base-dir = "/srv/backup"
tmp-dir = "@KEYS@/build"
engine = "rustic"

[settings.globals]
KEYS = "@KEYS@"
HOST = "nas"

[repos.local]
kind = "local"
path = "$BDIR/restic"
repo-key-file = "$KEYS/repo.key"

[repos.cloud]
kind = "s3"
endpoint = "https://s3.example.com"
region = "eu-west-1"
bucket = "$HOST-backups"
path = "/machines/$HOST"
access-key-file = "$KEYS/s3.id"
secret-key-file = "$KEYS/s3.secret"
repo-key-file = "$KEYS/repo.key"
default = true

[[hooks.before-all]]
kind = "btrfs"
action = "snapshot"
subvolume = "/home"
snapshot = "$BDIR/.snap/home"

[[hooks.after-all]]
kind = "btrfs"
action = "delete"
subvolume = "$BDIR/.snap/home"

[[hooks.after-all]]
kind = "command"
command = "logger 'backup on $HOST done'"

[profiles.home]
paths = ["$BDIR/.snap/home"]
exclude-paths = ["$BDIR/.snap/home/*/.cache"]
cli-args = ["--one-file-system"]

[profiles.db]
repo = "local"
command = "pg_dumpall"
"#,
        )
        .unwrap();

    let settings = config.settings();
    assert_eq!(settings.engine, "rustic");
    assert_eq!(settings.build_dir, fixture.path().join("build"));
    assert_eq!(config.expander().globals()["HOST"], "nas");

    assert_eq!(
        config.repos().keys().collect::<Vec<_>>(),
        ["local", "cloud"]
    );
    match config.repository("cloud").unwrap() {
        Repository::S3(s3) => {
            assert_eq!(s3.bucket, "nas-backups");
            assert_eq!(s3.relative_path(), "machines/nas");
            assert_eq!(s3.region, "eu-west-1");
            assert_eq!(s3.access_key_file.path(), fixture.path().join("s3.id"));
        }
        Repository::Local(_) => panic!("expected s3 repository"),
    }

    assert_eq!(config.hooks().phase(HookPhase::BeforeAll).len(), 1);
    let after = config.hooks().phase(HookPhase::AfterAll);
    assert!(matches!(after[0], Hook::Btrfs(_)));
    assert!(matches!(&after[1], Hook::Command(c) if c.command == "logger 'backup on nas done'"));

    let home = config.profile("home").unwrap();
    assert_eq!(config.resolve(home).unwrap().name(), "cloud");
    match home {
        Profile::Paths(p) => {
            assert_eq!(p.paths, ["/srv/backup/.snap/home"]);
            assert_eq!(p.exclude_paths, ["/srv/backup/.snap/home/*/.cache"]);
            assert_eq!(p.cli_args, ["--one-file-system"]);
        }
        Profile::Command(_) => panic!("expected paths profile"),
    }

    let db = config.profile("db").unwrap();
    assert_eq!(config.resolve(db).unwrap().name(), "local");
    assert!(matches!(db, Profile::Command(c) if c.command == ["pg_dumpall"]));
}

#[test]
fn test_missing_credentials_are_masked() {
    let fixture = Fixture::new();
    let err = fixture
        .load(
            r#"
[repos.cloud]
kind = "s3"
bucket = "b"
secret-key-file = "/very/secret/location"
repo-key-file = "@KEYS@/repo.key"
"#,
        )
        .unwrap_err();

    let report = cause(&err);
    assert_eq!(
        report,
        "repo \"cloud\": field 'secret-key-file': file [masked] not found\nno repositories defined"
    );
    assert!(!report.contains("very/secret"));
}

#[test]
fn test_errors_across_sections() {
    let fixture = Fixture::new();
    let err = fixture
        .load(
            r#"
[repos.disk]
kind = "local"
path = "/srv/restic"
repo-key-file = "@KEYS@/repo.key"

[repos.tape]
kind = "tape"

[[hooks.before-all]]
kind = "command"
command = "echo $UNSET"

[[hooks.after-all]]
kind = "zfs"

[profiles.nothing]
repo = "disk"
"#,
        )
        .unwrap_err();

    assert_eq!(
        err.aggregate().unwrap().lines(),
        [
            "repo \"tape\": unsupported kind: tape",
            "hook: before-all command: variable $UNSET is not defined",
            "hook: Unsupported after-all: zfs",
            "profile \"nothing\": no paths or command provided",
        ]
    );
}

#[test]
fn test_missing_and_malformed_files() {
    let fixture = Fixture::new();

    let missing = fixture.path().join("absent.toml");
    let err = Config::load_with(&missing, LoadOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Config {} does not exist", missing.display())
    );

    let err = fixture.load("[repos.disk\nkind = 1").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}
