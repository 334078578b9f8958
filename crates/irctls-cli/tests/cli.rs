//! Command-line behaviour against real PEM files.

use assert_cmd::Command;
use predicates::prelude::*;
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> PathBuf {
        self.path("config.toml")
    }

    fn irctls(&self) -> Command {
        let mut cmd = Command::cargo_bin("irctls").unwrap();
        cmd.env_remove("IRCTLS_LOG")
            .env_remove("IRCTLS_CONFIG")
            .arg("--no-color")
            .arg("--config")
            .arg(self.config());
        cmd
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

fn params(common_name: &str) -> CertificateParams {
    let now = OffsetDateTime::now_utc();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params.not_before = now - Duration::days(1);
    params.not_after = now + Duration::days(30);
    params
}

fn self_signed_pem(common_name: &str) -> String {
    let key = KeyPair::generate().unwrap();
    params(common_name).self_signed(&key).unwrap().pem()
}

/// (chain, root) PEM for a leaf signed by a fresh root.
fn ca_chain_pem(common_name: &str) -> (String, String) {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = params("Test Root");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca = ca_params.self_signed(&ca_key).unwrap();

    let key = KeyPair::generate().unwrap();
    let leaf = params(common_name).signed_by(&key, &ca, &ca_key).unwrap();
    (format!("{}{}", leaf.pem(), ca.pem()), ca.pem())
}

fn empty_bundle(fx: &Fixture) -> PathBuf {
    fx.write("empty.pem", "")
}

fn check(fx: &Fixture, chain: &Path, host: &str) -> Command {
    let mut cmd = fx.irctls();
    cmd.arg("check")
        .arg(chain)
        .args(["--host", host])
        .arg("--ca-file")
        .arg(empty_bundle(fx))
        .write_stdin("");
    cmd
}

#[test]
fn disconnect_rejects() {
    let fx = Fixture::new();
    let chain = fx.write("chain.pem", &self_signed_pem("irc.example.net"));

    check(&fx, &chain, "irc.example.net")
        .args(["--action", "disconnect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not trusted"));
}

#[test]
fn non_interactive_without_action_disconnects() {
    let fx = Fixture::new();
    let chain = fx.write("chain.pem", &self_signed_pem("irc.example.net"));

    check(&fx, &chain, "irc.example.net")
        .assert()
        .failure()
        .stderr(predicate::str::contains("certificate rejected"));
}

#[test]
fn always_is_remembered() {
    let fx = Fixture::new();
    let chain = fx.write("chain.pem", &self_signed_pem("irc.example.net"));

    check(&fx, &chain, "irc.example.net")
        .args(["--action", "always"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issuer is not trusted"));

    fx.irctls()
        .args(["-o", "json", "config", "trusted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"").count(2));

    // Now accepted without asking.
    check(&fx, &chain, "irc.example.net")
        .assert()
        .success()
        .stdout(predicate::str::contains("certificate accepted"));
}

#[test]
fn once_is_not_remembered() {
    let fx = Fixture::new();
    let chain = fx.write("chain.pem", &self_signed_pem("irc.example.net"));

    check(&fx, &chain, "irc.example.net")
        .args(["--action", "once"])
        .assert()
        .success();

    fx.irctls()
        .args(["config", "trusted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No manually trusted"));
}

#[test]
fn trusted_chain_passes() {
    let fx = Fixture::new();
    let (chain, root) = ca_chain_pem("irc.example.net");
    let chain = fx.write("chain.pem", &chain);
    let root = fx.write("root.pem", &root);

    fx.irctls()
        .arg("check")
        .arg(&chain)
        .args(["--host", "irc.example.net", "--ca-file"])
        .arg(&root)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("certificate accepted"));
}

#[test]
fn json_report_for_wrong_host() {
    let fx = Fixture::new();
    let (chain, root) = ca_chain_pem("irc.example.net");
    let chain = fx.write("chain.pem", &chain);
    let root = fx.write("root.pem", &root);

    let output = fx
        .irctls()
        .args(["-o", "json", "check"])
        .arg(&chain)
        .args(["--host", "irc.example.org", "--action", "disconnect", "--ca-file"])
        .arg(&root)
        .write_stdin("")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["accepted"], false);
    assert_eq!(document["reason"], "Not trusted");
    assert_eq!(document["report"]["problems"][0]["kind"], "wrong_host");
    assert_eq!(document["report"]["chain"][1]["trusted"], true);
}

#[test]
fn inspect_shows_details() {
    let fx = Fixture::new();
    let (chain, _) = ca_chain_pem("irc.example.net");
    let chain = fx.write("chain.pem", &chain);

    fx.irctls()
        .arg("inspect")
        .arg(&chain)
        .arg("--ca-file")
        .arg(empty_bundle(&fx))
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject"))
        .stdout(predicate::str::contains("Test Root"))
        .stdout(predicate::str::contains("Fingerprint"));
}

#[test]
fn config_set_and_show() {
    let fx = Fixture::new();

    fx.irctls()
        .args(["config", "set", "checkhost", "false"])
        .assert()
        .success();

    fx.irctls()
        .args(["-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"checkhost\": false"));

    fx.irctls()
        .args(["config", "set", "nonsense", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn config_path_is_the_given_file() {
    let fx = Fixture::new();
    fx.irctls()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn store_counts_bundle() {
    let fx = Fixture::new();
    let (_, root) = ca_chain_pem("irc.example.net");
    let root = fx.write("root.pem", &root);

    fx.irctls()
        .args(["store", "--list", "--ca-file"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Certificates: 1"))
        .stdout(predicate::str::contains("Test Root"));
}
