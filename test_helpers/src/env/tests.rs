//! Unit tests for environment guards.

use super::*;
use std::sync::{Arc, Barrier};
use std::thread;

use anyhow::{Result, anyhow, ensure};
use rstest::rstest;

fn read(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[rstest]
#[case::previously_set(Some("before"))]
#[case::previously_unset(None)]
fn set_var_restores_prior_state(#[case] prior: Option<&str>) -> Result<()> {
    let key = format!("FORGE_HELPERS_SET_{}", prior.is_some());
    let _outer = match prior {
        Some(value) => set_var(key.as_str(), value),
        None => remove_var(key.as_str()),
    };
    {
        let guard = set_var(key.as_str(), "during");
        ensure!(guard.key() == key);
        ensure!(read(&key).as_deref() == Some("during"));
    }
    ensure!(read(&key).as_deref() == prior, "value not restored");
    Ok(())
}

#[rstest]
fn remove_var_restores_value() -> Result<()> {
    let key = "FORGE_HELPERS_REMOVE";
    let _base = set_var(key, "kept");
    {
        let _removed = remove_var(key);
        ensure!(read(key).is_none());
    }
    ensure!(read(key).as_deref() == Some("kept"));
    Ok(())
}

#[rstest]
fn stacked_guards_unwind_in_reverse() -> Result<()> {
    let key = "FORGE_HELPERS_STACK";
    let _clean = remove_var(key);
    let first = set_var(key, "v1");
    let second = set_var(key, "v2");
    ensure!(read(key).as_deref() == Some("v2"));
    drop(second);
    ensure!(read(key).as_deref() == Some("v1"));
    drop(first);
    ensure!(read(key).is_none());
    Ok(())
}

#[rstest]
fn scope_sets_and_restores_all() -> Result<()> {
    let _clean_a = remove_var("FORGE_HELPERS_SCOPE_A");
    let _clean_b = remove_var("FORGE_HELPERS_SCOPE_B");
    {
        let scoped = scope([
            ("FORGE_HELPERS_SCOPE_A", "1"),
            ("FORGE_HELPERS_SCOPE_B", "2"),
        ]);
        ensure!(scoped.len() == 2 && !scoped.is_empty());
        ensure!(read("FORGE_HELPERS_SCOPE_A").as_deref() == Some("1"));
        ensure!(read("FORGE_HELPERS_SCOPE_B").as_deref() == Some("2"));
    }
    ensure!(read("FORGE_HELPERS_SCOPE_A").is_none());
    ensure!(read("FORGE_HELPERS_SCOPE_B").is_none());
    Ok(())
}

#[rstest]
fn concurrent_workers_leave_originals() -> Result<()> {
    const WORKERS: usize = 4;
    const ROUNDS: usize = 8;
    let keys: Vec<String> = (0..WORKERS)
        .map(|worker| format!("FORGE_HELPERS_WORKER_{worker}"))
        .collect();
    let _originals: Vec<EnvVarGuard> = keys
        .iter()
        .map(|key| set_var(key.as_str(), "original"))
        .collect();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = keys
        .iter()
        .cloned()
        .map(|key| {
            let gate = Arc::clone(&barrier);
            thread::spawn(move || {
                gate.wait();
                (0..ROUNDS).all(|round| {
                    let value = format!("{key}-{round}");
                    let guard = set_var(key.as_str(), &value);
                    let seen = read(&key) == Some(value);
                    drop(guard);
                    seen && read(&key).as_deref() == Some("original")
                })
            })
        })
        .collect();

    for handle in handles {
        let consistent = handle
            .join()
            .map_err(|_| anyhow!("environment worker panicked"))?;
        ensure!(consistent, "worker observed a foreign value");
    }
    Ok(())
}
