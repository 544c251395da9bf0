//! Anki package (`.apkg`) writer.
//!
//! A package is a zip archive holding a `collection.anki2` SQLite database,
//! the media files renamed to `0`, `1`, ... and a `media` JSON manifest
//! mapping those numbers back to file names. The archive is written to a
//! temporary file next to its destination and only renamed into place once
//! it is complete.

use super::{Deck, DeckWriter, NoteModel};
use crate::error::{KartkaError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const COLLECTION_FILE: &str = "collection.anki2";
const MEDIA_MANIFEST: &str = "media";
const FIELD_SEPARATOR: &str = "\x1f";
const DEFAULT_DECK_ID: i64 = 1;

const SCHEMA: &str = r#"
CREATE TABLE col (
    id integer primary key,
    crt integer not null,
    mod integer not null,
    scm integer not null,
    ver integer not null,
    dty integer not null,
    usn integer not null,
    ls integer not null,
    conf text not null,
    models text not null,
    decks text not null,
    dconf text not null,
    tags text not null
);
CREATE TABLE notes (
    id integer primary key,
    guid text not null,
    mid integer not null,
    mod integer not null,
    usn integer not null,
    tags text not null,
    flds text not null,
    sfld integer not null,
    csum integer not null,
    flags integer not null,
    data text not null
);
CREATE TABLE cards (
    id integer primary key,
    nid integer not null,
    did integer not null,
    ord integer not null,
    mod integer not null,
    usn integer not null,
    type integer not null,
    queue integer not null,
    due integer not null,
    ivl integer not null,
    factor integer not null,
    reps integer not null,
    lapses integer not null,
    left integer not null,
    odue integer not null,
    odid integer not null,
    flags integer not null,
    data text not null
);
CREATE TABLE revlog (
    id integer primary key,
    cid integer not null,
    usn integer not null,
    ease integer not null,
    ivl integer not null,
    lastIvl integer not null,
    factor integer not null,
    time integer not null,
    type integer not null
);
CREATE TABLE graves (
    usn integer not null,
    oid integer not null,
    type integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
"#;

/// Writes decks as `.apkg` packages into an output directory.
pub struct AnkiPackageWriter {
    output_dir: PathBuf,
}

impl AnkiPackageWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl DeckWriter for AnkiPackageWriter {
    #[instrument(skip_all, fields(deck = %deck.name, notes = deck.notes.len()))]
    async fn write(&self, deck: &Deck) -> Result<PathBuf> {
        let media = plan_media(&deck.media)?;

        let staging = tempfile::tempdir()?;
        let collection = staging.path().join(COLLECTION_FILE);
        build_collection(&collection, deck, Utc::now().timestamp_millis())?;

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| KartkaError::io(&self.output_dir, e))?;
        let package = self.output_dir.join(&deck.package_name);

        let mut archive = tempfile::NamedTempFile::new_in(&self.output_dir)
            .map_err(|e| KartkaError::io(&self.output_dir, e))?;
        write_archive(archive.as_file_mut(), &collection, &media)?;
        archive
            .persist(&package)
            .map_err(|e| KartkaError::io(&package, e.error))?;

        info!(
            "Wrote {} notes and {} media files to {:?}",
            deck.notes.len(),
            media.len(),
            package
        );
        Ok(package)
    }
}

/// A media file as bundled: numbered entry `index`, known to cards as `name`.
#[derive(Debug, PartialEq)]
pub(crate) struct MediaEntry<'a> {
    pub index: usize,
    pub name: &'a str,
    pub path: &'a Path,
}

/// Number media files in first-use order. A path listed twice is bundled
/// once; two different paths sharing a file name are an error, since cards
/// reference media by file name only.
pub(crate) fn plan_media(media: &[PathBuf]) -> Result<Vec<MediaEntry<'_>>> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    let mut entries = Vec::new();

    for path in media {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| KartkaError::Package(format!("Invalid media path: {:?}", path)))?;

        match seen.get(name) {
            Some(existing) if *existing == path.as_path() => continue,
            Some(existing) => {
                return Err(KartkaError::Package(format!(
                    "Media name {} is used by both {:?} and {:?}",
                    name, existing, path
                )))
            }
            None => {
                seen.insert(name, path);
                entries.push(MediaEntry {
                    index: entries.len(),
                    name,
                    path,
                });
            }
        }
    }

    Ok(entries)
}

/// Zip the collection, the numbered media files and the media manifest.
fn write_archive<W: Write + Seek>(
    writer: W,
    collection: &Path,
    media: &[MediaEntry<'_>],
) -> Result<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file(COLLECTION_FILE, options)?;
    let mut file = File::open(collection).map_err(|e| KartkaError::io(collection, e))?;
    std::io::copy(&mut file, &mut zip)?;

    let mut manifest = serde_json::Map::new();
    for entry in media {
        let index = entry.index.to_string();
        zip.start_file(index.as_str(), options)?;
        let mut file = File::open(entry.path).map_err(|e| KartkaError::io(entry.path, e))?;
        std::io::copy(&mut file, &mut zip)?;
        manifest.insert(index, Value::String(entry.name.to_string()));
    }

    zip.start_file(MEDIA_MANIFEST, options)?;
    zip.write_all(serde_json::to_string(&manifest)?.as_bytes())?;
    zip.finish()?;

    debug!("Bundled {} media files", media.len());
    Ok(())
}

/// Create the collection database for a deck.
pub(crate) fn build_collection(path: &Path, deck: &Deck, now_ms: i64) -> Result<()> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let now_s = now_ms / 1000;
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO col VALUES (null, ?1, ?2, ?3, 11, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
        params![
            now_s,
            now_ms,
            now_ms,
            collection_conf(&deck.model).to_string(),
            models_json(deck, now_s).to_string(),
            decks_json(deck, now_s).to_string(),
            dconf_json().to_string(),
        ],
    )?;

    let mut card_id = now_ms;
    for (index, note) in deck.notes.iter().enumerate() {
        let note_id = now_ms + index as i64;
        let fields = deck.model.field_values(note);
        let sort_field = fields.first().cloned().unwrap_or_default();

        tx.execute(
            "INSERT INTO notes VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
            params![
                note_id,
                guid_for(&note.id),
                deck.model.id,
                now_s,
                fields.join(FIELD_SEPARATOR),
                sort_field,
                field_checksum(&sort_field),
            ],
        )?;

        for ord in 0..deck.model.templates.len() {
            tx.execute(
                "INSERT INTO cards VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
                params![card_id, note_id, deck.id, ord as i64, now_s, index as i64 + 1],
            )?;
            card_id += 1;
        }
    }

    tx.commit()?;
    Ok(())
}

const BASE91_TABLE: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Stable note GUID derived from the note id, so re-importing a deck updates
/// existing notes instead of duplicating them.
pub fn guid_for(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let mut value = u64::from_be_bytes(bytes);

    if value == 0 {
        return "a".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Duplicate-detection checksum of the sort field.
fn field_checksum(field: &str) -> i64 {
    let digest = Sha256::digest(field.as_bytes());
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&digest[..4]);
    u32::from_be_bytes(bytes) as i64
}

fn collection_conf(model: &NoteModel) -> Value {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "curDeck": DEFAULT_DECK_ID,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "curModel": model.id.to_string(),
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true
    })
}

fn models_json(deck: &Deck, now_s: i64) -> Value {
    let model = &deck.model;

    let fields: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name,
                "ord": ord,
                "sticky": false,
                "rtl": false,
                "font": "Arial",
                "size": 20,
                "media": []
            })
        })
        .collect();

    let templates: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ord, t)| {
            json!({
                "name": t.name,
                "ord": ord,
                "qfmt": t.qfmt,
                "afmt": t.afmt,
                "did": null,
                "bqfmt": "",
                "bafmt": ""
            })
        })
        .collect();

    // A card is generated when any field shown on its front is non-empty.
    let req: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ord, t)| {
            let shown: Vec<usize> = model
                .fields
                .iter()
                .enumerate()
                .filter(|(_, name)| t.qfmt.contains(&format!("{{{{{}}}}}", name)))
                .map(|(i, _)| i)
                .collect();
            json!([ord, "any", shown])
        })
        .collect();

    json!({
        model.id.to_string(): {
            "id": model.id,
            "name": model.name,
            "type": 0,
            "mod": now_s,
            "usn": -1,
            "sortf": 0,
            "did": deck.id,
            "tmpls": templates,
            "flds": fields,
            "css": ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n",
            "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
            "latexPost": "\\end{document}",
            "latexsvg": false,
            "req": req,
            "tags": [],
            "vers": []
        }
    })
}

fn deck_json(id: i64, name: &str, now_s: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": now_s,
        "usn": -1,
        "collapsed": false,
        "browserCollapsed": false,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0],
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50
    })
}

fn decks_json(deck: &Deck, now_s: i64) -> Value {
    json!({
        DEFAULT_DECK_ID.to_string(): deck_json(DEFAULT_DECK_ID, "Default", now_s),
        deck.id.to_string(): deck_json(deck.id, &deck.name, now_s),
    })
}

fn dconf_json() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "dyn": false,
            "maxTaken": 60,
            "timer": 0,
            "autoplay": true,
            "replayq": true,
            "new": {
                "delays": [1, 10],
                "ints": [1, 4, 7],
                "initialFactor": 2500,
                "order": 1,
                "perDay": 20,
                "bury": true,
                "separate": true
            },
            "rev": {
                "perDay": 200,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "bury": true,
                "minSpace": 1
            },
            "lapse": {
                "delays": [10],
                "mult": 0,
                "minInt": 1,
                "leechFails": 8,
                "leechAction": 0
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeckSettings;
    use crate::deck::NoteRecord;
    use std::collections::BTreeSet;
    use std::io::Read;

    fn deck(media: Vec<PathBuf>) -> Deck {
        let notes = vec![
            NoteRecord {
                id: "1".to_string(),
                source_field: "kot".to_string(),
                target_field: "кіт".to_string(),
                examples_field: "<ul><li>To jest kot.</li></ul>".to_string(),
                audio_field: "[sound:1_a.mp3]".to_string(),
            },
            NoteRecord {
                id: "2".to_string(),
                source_field: "pies".to_string(),
                target_field: "пес".to_string(),
                examples_field: "<ul></ul>".to_string(),
                audio_field: String::new(),
            },
        ];
        Deck {
            id: 1426754026,
            name: "PL-UA Deck".to_string(),
            model: NoteModel::vocabulary(&DeckSettings::default()),
            package_name: "plua.apkg".to_string(),
            notes,
            media,
        }
    }

    #[test]
    fn test_collection_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COLLECTION_FILE);
        build_collection(&path, &deck(Vec::new()), 1_700_000_000_000).unwrap();

        let conn = Connection::open(&path).unwrap();
        let notes: i64 = conn.query_row("SELECT count(*) FROM notes", [], |r| r.get(0)).unwrap();
        let cards: i64 = conn.query_row("SELECT count(*) FROM cards", [], |r| r.get(0)).unwrap();
        assert_eq!(notes, 2);
        assert_eq!(cards, 4);

        let flds: String = conn
            .query_row("SELECT flds FROM notes ORDER BY id LIMIT 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(
            flds.split(FIELD_SEPARATOR).collect::<Vec<_>>(),
            vec!["1", "kot", "кіт", "<ul><li>To jest kot.</li></ul>", "[sound:1_a.mp3]"]
        );

        let models: String = conn.query_row("SELECT models FROM col", [], |r| r.get(0)).unwrap();
        let models: Value = serde_json::from_str(&models).unwrap();
        let model = &models["1864309187"];
        assert_eq!(model["name"], "PL-UA Model");
        assert_eq!(model["req"], json!([[0, "any", [2]], [1, "any", [1]]]));

        let decks: String = conn.query_row("SELECT decks FROM col", [], |r| r.get(0)).unwrap();
        let decks: Value = serde_json::from_str(&decks).unwrap();
        assert_eq!(decks["1426754026"]["name"], "PL-UA Deck");
    }

    #[test]
    fn test_guid_is_stable() {
        assert_eq!(guid_for("1"), guid_for("1"));
        assert_ne!(guid_for("1"), guid_for("2"));
        assert!(guid_for("1").bytes().all(|b| BASE91_TABLE.contains(&b)));
    }

    fn read_package(path: &Path) -> (BTreeSet<String>, Value, i64) {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let names = archive.file_names().map(String::from).collect();

        let mut manifest = String::new();
        archive.by_name(MEDIA_MANIFEST).unwrap().read_to_string(&mut manifest).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(COLLECTION_FILE);
        let mut out = File::create(&db).unwrap();
        std::io::copy(&mut archive.by_name(COLLECTION_FILE).unwrap(), &mut out).unwrap();
        let notes = Connection::open(&db)
            .unwrap()
            .query_row("SELECT count(*) FROM notes", [], |r| r.get(0))
            .unwrap();

        (names, serde_json::from_str(&manifest).unwrap(), notes)
    }

    #[test]
    fn test_plan_media_numbers_and_dedupes() {
        let a = PathBuf::from("/cache/1_a.mp3");
        let b = PathBuf::from("/cache/1_b.mp3");
        let media = [a.clone(), b.clone(), a.clone()];

        let planned = plan_media(&media).unwrap();
        assert_eq!(
            planned,
            vec![
                MediaEntry { index: 0, name: "1_a.mp3", path: &a },
                MediaEntry { index: 1, name: "1_b.mp3", path: &b },
            ]
        );
    }

    #[test]
    fn test_plan_media_rejects_name_clash() {
        let media = [PathBuf::from("a/chleb.mp3"), PathBuf::from("b/chleb.mp3")];
        let err = plan_media(&media).unwrap_err();
        assert!(matches!(err, KartkaError::Package(ref m) if m.contains("chleb.mp3")));
    }

    #[tokio::test]
    async fn test_writes_readable_package() {
        let src = tempfile::tempdir().unwrap();
        let sound = src.path().join("1_a.mp3");
        std::fs::write(&sound, b"ID3").unwrap();

        let out = tempfile::tempdir().unwrap();
        let writer = AnkiPackageWriter::new(&out.path().join("decks"));
        let package = writer.write(&deck(vec![sound.clone(), sound])).await.unwrap();
        assert_eq!(package, out.path().join("decks").join("plua.apkg"));

        let (names, manifest, notes) = read_package(&package);
        let expected: BTreeSet<String> =
            ["collection.anki2", "media", "0"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
        assert_eq!(manifest, json!({"0": "1_a.mp3"}));
        assert_eq!(notes, 2);

        let leftovers = std::fs::read_dir(out.path().join("decks")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_missing_media_writes_nothing() {
        let out = tempfile::tempdir().unwrap();
        let writer = AnkiPackageWriter::new(out.path());
        let err = writer
            .write(&deck(vec![PathBuf::from("/nonexistent/1_a.mp3")]))
            .await
            .unwrap_err();
        assert!(matches!(err, KartkaError::Io { .. }));
        assert!(err.to_string().contains("1_a.mp3"));
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
