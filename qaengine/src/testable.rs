//! The things checks run against and how they nest.
//!
//! Every font belongs to exactly one run and at most one family. Fonts read
//! from a collection file also belong to that collection.

use std::{
    collections::HashMap,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use write_fonts::read::FileRef;

use crate::font::Font;

/// File extensions picked up when a directory is given as input.
const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "otc"];

/// Identifies a testable, stable across runs over the same inputs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityId {
    Font { path: PathBuf, index: Option<u32> },
    Collection { path: PathBuf },
    Family { name: String },
    Run,
}

impl EntityId {
    pub fn scope(&self) -> Scope {
        match self {
            EntityId::Font { .. } => Scope::Font,
            EntityId::Collection { .. } => Scope::Collection,
            EntityId::Family { .. } => Scope::Family,
            EntityId::Run => Scope::Run,
        }
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Font {
                path,
                index: Some(idx),
            } => write!(f, "{}#{idx}", path.display()),
            EntityId::Font { path, index: None } => write!(f, "{}", path.display()),
            EntityId::Collection { path } => write!(f, "collection:{}", path.display()),
            EntityId::Family { name } => write!(f, "family:{name}"),
            EntityId::Run => f.write_str("run"),
        }
    }
}

/// The kind of entity a check or condition applies to.
///
/// Ordered from narrowest to widest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Font,
    Collection,
    Family,
    Run,
}

impl Scope {
    /// Whether an entity of this scope can sit inside one of `wider`.
    ///
    /// Collections and families cut across each other, so neither encloses
    /// the other. Fonts may be in both, everything is in the run.
    pub fn nests_in(self, wider: Scope) -> bool {
        match (self, wider) {
            (narrow, wide) if narrow == wide => true,
            (_, Scope::Run) => true,
            (Scope::Font, Scope::Collection | Scope::Family) => true,
            _ => false,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Scope::Font => "font",
            Scope::Collection => "collection",
            Scope::Family => "family",
            Scope::Run => "run",
        })
    }
}

/// An ordered group of fonts: a collection, a family or the whole run.
#[derive(Debug)]
pub struct FontSet {
    id: EntityId,
    name: String,
    fonts: Vec<Arc<Font>>,
}

impl FontSet {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fonts(&self) -> &[Arc<Font>] {
        &self.fonts
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// Something a check can run against.
#[derive(Clone, Debug)]
pub enum Testable {
    Font(Arc<Font>),
    Collection(Arc<FontSet>),
    Family(Arc<FontSet>),
    Run(Arc<FontSet>),
}

impl Testable {
    pub fn id(&self) -> &EntityId {
        match self {
            Testable::Font(font) => font.id(),
            Testable::Collection(set) | Testable::Family(set) | Testable::Run(set) => set.id(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Testable::Font(..) => Scope::Font,
            Testable::Collection(..) => Scope::Collection,
            Testable::Family(..) => Scope::Family,
            Testable::Run(..) => Scope::Run,
        }
    }

    /// Every font in this testable; a single font is a set of one.
    pub fn fonts(&self) -> &[Arc<Font>] {
        match self {
            Testable::Font(font) => std::slice::from_ref(font),
            Testable::Collection(set) | Testable::Family(set) | Testable::Run(set) => set.fonts(),
        }
    }

    pub fn as_font(&self) -> Option<&Arc<Font>> {
        match self {
            Testable::Font(font) => Some(font),
            _ => None,
        }
    }
}

/// How fonts are grouped into families.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Fonts in the same directory form a family.
    #[default]
    Directory,
    /// Fonts sharing a family name form a family.
    FamilyName,
}

/// Every entity in a run and the relations between them.
///
/// Built once, read-only afterwards.
#[derive(Debug)]
pub struct RunContext {
    run: Arc<FontSet>,
    collections: Vec<Arc<FontSet>>,
    families: Vec<Arc<FontSet>>,
    collection_of: HashMap<EntityId, usize>,
    family_of: HashMap<EntityId, usize>,
}

impl RunContext {
    /// Load the fonts at `inputs`.
    ///
    /// Directories contribute the font files directly inside them. Collection
    /// files contribute one font per member. Files that can't be read still
    /// become entities; their checks report the failure.
    pub fn load(inputs: &[PathBuf], group_by: GroupBy) -> RunContext {
        let mut fonts = Vec::new();
        for path in expand_inputs(inputs) {
            let path = fs::canonicalize(&path).unwrap_or(path);
            match fs::read(&path) {
                Ok(bytes) => fonts.extend(fonts_in(&path, bytes.into())),
                Err(e) => {
                    warn!("Unable to read {path:?}: {e}");
                    fonts.push(Font::unreadable(path, e));
                }
            }
        }
        RunContext::from_fonts(fonts, group_by)
    }

    /// Assemble a run from fonts already in memory.
    ///
    /// Fonts with a collection index are grouped into a collection by path.
    /// A font repeated in `fonts` is only kept once.
    pub fn from_fonts(fonts: Vec<Font>, group_by: GroupBy) -> RunContext {
        let mut unique: IndexMap<EntityId, Arc<Font>> = IndexMap::new();
        for font in fonts {
            if unique.contains_key(font.id()) {
                debug!("Ignoring repeated input {}", font.id());
                continue;
            }
            unique.insert(font.id().clone(), Arc::new(font));
        }
        let fonts: Vec<_> = unique.into_values().collect();

        let mut collection_members: IndexMap<PathBuf, Vec<Arc<Font>>> = IndexMap::new();
        for font in fonts.iter().filter(|f| f.index().is_some()) {
            collection_members
                .entry(font.path().to_path_buf())
                .or_default()
                .push(font.clone());
        }
        let mut collection_of = HashMap::new();
        let collections: Vec<_> = collection_members
            .into_iter()
            .enumerate()
            .map(|(i, (path, members))| {
                for font in members.iter() {
                    collection_of.insert(font.id().clone(), i);
                }
                Arc::new(FontSet {
                    id: EntityId::Collection { path: path.clone() },
                    name: path.display().to_string(),
                    fonts: members,
                })
            })
            .collect();

        let mut family_members: IndexMap<String, Vec<Arc<Font>>> = IndexMap::new();
        for font in fonts.iter() {
            family_members
                .entry(family_key(font, group_by))
                .or_default()
                .push(font.clone());
        }
        let mut family_of = HashMap::new();
        let families: Vec<_> = family_members
            .into_iter()
            .enumerate()
            .map(|(i, (name, members))| {
                for font in members.iter() {
                    family_of.insert(font.id().clone(), i);
                }
                Arc::new(FontSet {
                    id: EntityId::Family { name: name.clone() },
                    name,
                    fonts: members,
                })
            })
            .collect();

        debug!(
            "Run has {} fonts, {} collections and {} families",
            fonts.len(),
            collections.len(),
            families.len()
        );
        RunContext {
            run: Arc::new(FontSet {
                id: EntityId::Run,
                name: "run".to_string(),
                fonts,
            }),
            collections,
            families,
            collection_of,
            family_of,
        }
    }

    pub fn fonts(&self) -> &[Arc<Font>] {
        self.run.fonts()
    }

    pub fn collections(&self) -> &[Arc<FontSet>] {
        &self.collections
    }

    pub fn families(&self) -> &[Arc<FontSet>] {
        &self.families
    }

    pub fn is_empty(&self) -> bool {
        self.run.is_empty()
    }

    pub fn run(&self) -> Testable {
        Testable::Run(self.run.clone())
    }

    /// Every testable of the given scope, in a stable order.
    pub fn testables(&self, scope: Scope) -> Vec<Testable> {
        match scope {
            Scope::Font => self.fonts().iter().cloned().map(Testable::Font).collect(),
            Scope::Collection => self
                .collections
                .iter()
                .cloned()
                .map(Testable::Collection)
                .collect(),
            Scope::Family => self
                .families
                .iter()
                .cloned()
                .map(Testable::Family)
                .collect(),
            Scope::Run => vec![self.run()],
        }
    }

    /// The entity of `scope` that contains `testable`.
    ///
    /// A testable encloses itself. None if there is no such entity, for
    /// example the collection of a standalone font.
    pub fn enclosing(&self, testable: &Testable, scope: Scope) -> Option<Testable> {
        if testable.scope() == scope {
            return Some(testable.clone());
        }
        match (testable, scope) {
            (_, Scope::Run) => Some(self.run()),
            (Testable::Font(font), Scope::Family) => self
                .family_of
                .get(font.id())
                .map(|i| Testable::Family(self.families[*i].clone())),
            (Testable::Font(font), Scope::Collection) => self
                .collection_of
                .get(font.id())
                .map(|i| Testable::Collection(self.collections[*i].clone())),
            _ => None,
        }
    }
}

fn family_key(font: &Font, group_by: GroupBy) -> String {
    let dir = || {
        font.path()
            .parent()
            .map(|p| p.display().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string())
    };
    match group_by {
        GroupBy::Directory => dir(),
        GroupBy::FamilyName => font.family_name().unwrap_or_else(dir),
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or_default()
}

fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        match fs::read_dir(input) {
            Ok(entries) => {
                let mut found: Vec<_> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_file() && is_font_file(p))
                    .collect();
                found.sort();
                paths.extend(found);
            }
            Err(e) => {
                warn!("Unable to list {input:?}: {e}");
                paths.push(input.clone());
            }
        }
    }
    paths
}

/// One font per collection member, or just the one font.
///
/// Bytes that don't parse at all are treated as a single font so the
/// failure shows up when checks decode it.
fn fonts_in(path: &Path, data: Arc<[u8]>) -> Vec<Font> {
    let members = match FileRef::new(&data) {
        Ok(FileRef::Collection(collection)) => Some(collection.len()),
        _ => None,
    };
    match members {
        Some(count) => (0..count)
            .map(|idx| Font::new(path, Some(idx), data.clone()))
            .collect(),
        None => vec![Font::new(path, None, data)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{garbage, minimal_collection, minimal_font};
    use pretty_assertions::assert_eq;

    fn font(path: &str, index: Option<u32>) -> Font {
        Font::new(path, index, minimal_font())
    }

    fn ids(testables: &[Testable]) -> Vec<String> {
        testables.iter().map(|t| t.id().to_string()).collect()
    }

    #[test]
    fn families_by_directory() {
        let run = RunContext::from_fonts(
            vec![
                font("a/One.ttf", None),
                font("b/Two.ttf", None),
                font("a/Three.ttf", None),
            ],
            GroupBy::Directory,
        );
        assert_eq!(
            vec!["family:a", "family:b"],
            ids(&run.testables(Scope::Family))
        );
        assert_eq!(2, run.families()[0].len());
        assert!(run.collections().is_empty());
    }

    #[test]
    fn enclosing_entities() {
        let run = RunContext::from_fonts(
            vec![font("x/c.ttc", Some(0)), font("x/c.ttc", Some(1)), font("x/s.ttf", None)],
            GroupBy::Directory,
        );
        let member = run.testables(Scope::Font).remove(1);
        let standalone = run.testables(Scope::Font).remove(2);

        let collection = run.enclosing(&member, Scope::Collection).unwrap();
        assert_eq!(
            &EntityId::Collection {
                path: "x/c.ttc".into()
            },
            collection.id()
        );
        assert_eq!(2, collection.fonts().len());
        assert!(run.enclosing(&standalone, Scope::Collection).is_none());

        let family = run.enclosing(&standalone, Scope::Family).unwrap();
        assert_eq!(3, family.fonts().len());
        assert_eq!(
            family.id(),
            run.enclosing(&member, Scope::Family).unwrap().id()
        );
        assert_eq!(&EntityId::Run, run.enclosing(&family, Scope::Run).unwrap().id());
        assert!(run.enclosing(&family, Scope::Font).is_none());
        assert_eq!(member.id(), run.enclosing(&member, Scope::Font).unwrap().id());
    }

    #[test]
    fn nesting_agrees_with_enclosing() {
        let run = RunContext::from_fonts(
            vec![font("x/c.ttc", Some(0)), font("x/c.ttc", Some(1)), font("x/s.ttf", None)],
            GroupBy::Directory,
        );
        let scopes = [Scope::Font, Scope::Collection, Scope::Family, Scope::Run];
        for narrow in scopes {
            for testable in run.testables(narrow) {
                for wide in scopes {
                    if run.enclosing(&testable, wide).is_some() {
                        assert!(narrow.nests_in(wide), "{narrow} in {wide}");
                    }
                }
            }
        }
        let collection = run.testables(Scope::Collection).remove(0);
        assert!(run.enclosing(&collection, Scope::Family).is_none());
        assert!(!Scope::Collection.nests_in(Scope::Family));
        assert!(!Scope::Family.nests_in(Scope::Collection));
        assert!(Scope::Collection.nests_in(Scope::Run));
    }

    #[test]
    fn repeated_inputs_are_one_entity() {
        let run = RunContext::from_fonts(
            vec![font("a/One.ttf", None), font("a/One.ttf", None)],
            GroupBy::Directory,
        );
        assert_eq!(1, run.fonts().len());
        let family = &run.families()[0];
        assert!(Arc::ptr_eq(&run.fonts()[0], &family.fonts()[0]));
    }

    #[test]
    fn load_expands_directories_and_collections() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("b.ttf"), minimal_font()).unwrap();
        fs::write(dir.join("a.ttc"), minimal_collection(2)).unwrap();
        fs::write(dir.join("notes.txt"), "not a font").unwrap();
        fs::write(dir.join("bad.otf"), garbage()).unwrap();

        let run = RunContext::load(&[dir.to_path_buf()], GroupBy::Directory);
        let names: Vec<_> = run.fonts().iter().map(|f| f.file_name()).collect();
        assert_eq!(vec!["a.ttc#0", "a.ttc#1", "b.ttf", "bad.otf"], names);
        assert_eq!(1, run.collections().len());
        assert_eq!(1, run.families().len());
        assert!(run.fonts()[1].decode().is_ok());
        assert!(run.fonts()[3].decode().is_err());
    }

    #[test]
    fn load_keeps_missing_files() {
        let run = RunContext::load(&["/no/such/font.ttf".into()], GroupBy::Directory);
        assert_eq!(1, run.fonts().len());
        assert!(run.fonts()[0].bytes().is_err());
    }
}
