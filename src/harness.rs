//! A typed command stream run against both the [`Dict`] oracle and a
//! tree, checking their answers agree after every command.
//!
//! Grounded on `original_source/llrb/validate/main.go`'s `validate`/
//! `validateEqual`/`isReadOp`/`withLLRBMVCC`/`concurrent_reader`. The
//! original drives this stream from a `monster`/`goparsec` grammar-based
//! random generator; that generator is an external collaborator out of
//! scope here (see SPEC_FULL.md) and is replaced by an injected iterator
//! of [`Command`] values supplied by the caller (typically a test's own
//! RNG-driven loop).

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::mpsc;
use std::thread;

use crate::dict::Dict;
use crate::error::{Error, Result};
use crate::key::{Bound, Key};
use crate::mvcc::{Mvcc, Snapshot};
use crate::node::Entry;
use crate::traits::{Inclusion, Reader, Writer};

/// One operation in a validation run. Mirrors the seven command names the
/// Go harness's grammar produces, plus nothing else: no `snapshot`
/// pseudo-command here, since opening snapshots is a harness-driven
/// event rather than part of the command vocabulary (see
/// [`run_concurrent`]).
#[derive(Clone, Debug)]
pub enum Command<K, V> {
    Get(K),
    Min,
    Max,
    Upsert(K, V),
    Insert(K, V),
    Delete(K),
    DelMin,
    DelMax,
}

fn command_name<K, V>(cmd: &Command<K, V>) -> &'static str {
    match cmd {
        Command::Get(_) => "get",
        Command::Min => "min",
        Command::Max => "max",
        Command::Upsert(..) => "upsert",
        Command::Insert(..) => "insert",
        Command::Delete(_) => "delete",
        Command::DelMin => "delmin",
        Command::DelMax => "delmax",
    }
}

/// `true` for `get`/`min`/`max`: commands a reader holding a read-only
/// snapshot may run. Everything else mutates and is a writer-only
/// command.
pub fn is_read_op<K, V>(cmd: &Command<K, V>) -> bool {
    matches!(cmd, Command::Get(_) | Command::Min | Command::Max)
}

/// Run one command against both `dict` and `tree`, returning
/// `Error::ValidationMismatch` the moment their answers disagree — the
/// Rust counterpart of the Go original's `log.Fatalf` on
/// `reflect.DeepEqual` failure, left to the caller to treat as fatal.
pub fn validate_one<K, V, T>(dict: &mut Dict<K, V>, tree: &mut T, cmd: Command<K, V>) -> Result<()>
where
    K: Key + Eq + Hash + Debug,
    V: Clone + PartialEq + Debug,
    T: Reader<K, V> + Writer<K, V>,
{
    let name = command_name(&cmd);
    let (want, got) = match cmd {
        Command::Get(key) => (dict.get(&key), tree.get(&key)),
        Command::Min => (dict.min(), tree.min()),
        Command::Max => (dict.max(), tree.max()),
        Command::DelMin => (dict.delete_min(), tree.delete_min()),
        Command::DelMax => (dict.delete_max(), tree.delete_max()),
        Command::Upsert(key, value) => {
            let entry = Entry::new(key, value);
            (dict.upsert(entry.clone()), tree.upsert(entry))
        }
        // An insert of a key already present degrades to an upsert, just
        // as in the Go harness, since `Writer::insert` never reports a
        // replaced entry and the oracle has no way to hold a duplicate.
        Command::Insert(key, value) => {
            let entry = Entry::new(key.clone(), value.clone());
            if tree.get(&key).is_some() {
                (dict.upsert(entry.clone()), tree.upsert(entry))
            } else {
                dict.insert(entry.clone());
                tree.insert(entry);
                (None, None)
            }
        }
        Command::Delete(key) => (dict.delete(&key), tree.delete(&key)),
    };
    if want != got {
        return Err(Error::ValidationMismatch(
            name,
            format!("{:?}", want),
            format!("{:?}", got),
        ));
    }
    Ok(())
}

/// Read-only counterpart of [`validate_one`], for a reader bound to a
/// snapshot: only `get`/`min`/`max` are legal, matching
/// `concurrent_reader`'s `log.Fatalf("write op not allowed")` guard.
fn validate_read_only<K, V, R>(dict: &Dict<K, V>, tree: &R, cmd: &Command<K, V>) -> Result<()>
where
    K: Key + Eq + Hash + Debug,
    V: Clone + PartialEq + Debug,
    R: Reader<K, V>,
{
    let (want, got) = match cmd {
        Command::Get(key) => (dict.get(key), tree.get(key)),
        Command::Min => (dict.min(), tree.min()),
        Command::Max => (dict.max(), tree.max()),
        _ => panic!("write op not allowed on a read-only snapshot: {:?}", cmd),
    };
    if want != got {
        return Err(Error::ValidationMismatch(
            command_name(cmd),
            format!("{:?}", want),
            format!("{:?}", got),
        ));
    }
    Ok(())
}

/// After a run completes, confirm the oracle and the tree agree on every
/// key in sorted order — the Go harness's final `validateEqual`.
pub fn validate_equal<K, V, T>(dict: &Dict<K, V>, tree: &T) -> Result<()>
where
    K: Key + Eq + Hash + Debug,
    V: Clone,
    T: Reader<K, V>,
{
    let mut dict_keys = Vec::new();
    dict.range(Bound::NegInf, Bound::PosInf, Inclusion::Both, |e| {
        dict_keys.push(e.key.clone());
        true
    });
    let mut tree_keys = Vec::new();
    tree.range(Bound::NegInf, Bound::PosInf, Inclusion::Both, |e| {
        tree_keys.push(e.key.clone());
        true
    });
    if dict_keys != tree_keys {
        return Err(Error::ValidationMismatch(
            "range",
            format!("{:?}", dict_keys),
            format!("{:?}", tree_keys),
        ));
    }
    Ok(())
}

enum ReaderMsg<K, V> {
    Snapshot(Dict<K, V>, Snapshot<K, V>),
    Cmd(Command<K, V>),
}

fn reader_loop<K, V>(rx: mpsc::Receiver<ReaderMsg<K, V>>) -> HashMap<&'static str, usize>
where
    K: Key + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + PartialEq + Debug + Send + Sync + 'static,
{
    let mut dict: Option<Dict<K, V>> = None;
    let mut snapshot: Option<Snapshot<K, V>> = None;
    let mut stats = HashMap::new();

    while let Ok(msg) = rx.recv() {
        match msg {
            ReaderMsg::Snapshot(d, s) => {
                dict = Some(d);
                snapshot = Some(s);
                *stats.entry("snapshot").or_insert(0) += 1;
            }
            ReaderMsg::Cmd(cmd) => {
                let dict = dict.as_ref().expect("reader not initialized with snapshot");
                let snapshot = snapshot
                    .as_ref()
                    .expect("reader not initialized with snapshot");
                validate_read_only(dict, snapshot, &cmd).expect("snapshot reader validation mismatch");
                *stats.entry(command_name(&cmd)).or_insert(0) += 1;
            }
        }
    }
    stats
}

/// Drive `commands` against a writer-owned [`Dict`]/[`Mvcc`] pair while
/// fanning read commands out to `num_readers` concurrent reader threads,
/// each bound to its own periodically refreshed snapshot.
///
/// `snapshot_every` commands, a fresh snapshot is handed to a subset of
/// readers — readers `0..(total % num_readers)`, preserving the Go
/// original's `if i >= total%4 { break }` skip (a bug or a deliberate
/// thinning of resnapshot traffic; see DESIGN.md) rather than refreshing
/// every reader on every tick.
pub fn run_concurrent<K, V, I>(
    mut dict: Dict<K, V>,
    writer: &mut Mvcc<K, V>,
    commands: I,
    num_readers: usize,
    snapshot_every: usize,
) -> Result<(Dict<K, V>, HashMap<&'static str, usize>, Vec<HashMap<&'static str, usize>>)>
where
    K: Key + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + PartialEq + Debug + Send + Sync + 'static,
    I: IntoIterator<Item = Command<K, V>>,
{
    let mut senders = Vec::with_capacity(num_readers);
    let mut handles = Vec::with_capacity(num_readers);
    for _ in 0..num_readers {
        let (tx, rx) = mpsc::channel::<ReaderMsg<K, V>>();
        senders.push(tx);
        handles.push(thread::spawn(move || reader_loop(rx)));
    }

    for (i, tx) in senders.iter().enumerate() {
        let _ = i;
        tx.send(ReaderMsg::Snapshot(dict.clone(), writer.rsnapshot(100)))
            .expect("reader thread gone");
    }

    let mut writer_stats = HashMap::new();
    let mut total = 0usize;
    for cmd in commands {
        total += 1;
        if is_read_op(&cmd) {
            for tx in &senders {
                tx.send(ReaderMsg::Cmd(cmd.clone())).expect("reader thread gone");
            }
        } else {
            validate_one(&mut dict, writer, cmd.clone())?;
            *writer_stats.entry(command_name(&cmd)).or_insert(0) += 1;
        }

        if snapshot_every > 0 && total % snapshot_every == 0 {
            let refresh_upto = total % num_readers.max(1);
            for (i, tx) in senders.iter().enumerate() {
                if i >= refresh_upto {
                    break;
                }
                tx.send(ReaderMsg::Snapshot(dict.clone(), writer.rsnapshot(100)))
                    .expect("reader thread gone");
            }
        }
    }

    drop(senders);
    let reader_stats = handles
        .into_iter()
        .map(|h| h.join().expect("reader thread panicked"))
        .collect();

    validate_equal(&dict, writer)?;
    Ok((dict, writer_stats, reader_stats))
}

#[path = "harness_test.rs"]
#[cfg(test)]
mod harness_test;
