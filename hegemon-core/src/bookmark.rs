//! Bookmarks: named starting points with a date and camera position.

use crate::registry::{HasIdentifier, Registry};
use crate::types::date::Date;
use crate::types::tree::{TreeValue, ValueTree};
use serde::{Deserialize, Serialize};

/// One bookmark, keyed by its insertion index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    identifier: String,
    index: usize,
    name: String,
    description: String,
    date: Date,
    initial_camera_x: u32,
    initial_camera_y: u32,
}

impl Bookmark {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn initial_camera_x(&self) -> u32 {
        self.initial_camera_x
    }

    pub fn initial_camera_y(&self) -> u32 {
        self.initial_camera_y
    }
}

impl HasIdentifier for Bookmark {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
pub struct BookmarkManager {
    bookmarks: Registry<Bookmark>,
}

impl Default for BookmarkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkManager {
    pub fn new() -> Self {
        Self {
            bookmarks: Registry::new("bookmarks"),
        }
    }

    pub fn add_bookmark(
        &mut self,
        name: &str,
        description: &str,
        date: Date,
        initial_camera_x: u32,
        initial_camera_y: u32,
    ) -> bool {
        let index = self.bookmarks.len();
        self.bookmarks.add(Bookmark {
            identifier: index.to_string(),
            index,
            name: name.to_owned(),
            description: description.to_owned(),
            date,
            initial_camera_x,
            initial_camera_y,
        })
    }

    /// Load a tree of `bookmark = { name desc date cameraX cameraY }`
    /// entries, then lock.
    pub fn load_bookmark_file(&mut self, root: &ValueTree) -> bool {
        let mut ok = true;
        for (key, entry) in root.entries() {
            if key != "bookmark" {
                log::error!("invalid bookmark declaration {}", key);
                ok = false;
                continue;
            }
            let Some(block) = entry.as_tree() else {
                log::error!("bookmark entry is not a block");
                ok = false;
                continue;
            };
            let name = block.get("name").and_then(TreeValue::as_scalar);
            let description = block.get("desc").and_then(TreeValue::as_scalar);
            let date = block.get("date").and_then(TreeValue::as_date);
            let camera_x = block.get("cameraX").and_then(TreeValue::as_u32);
            let camera_y = block.get("cameraY").and_then(TreeValue::as_u32);
            match (name, description, date, camera_x, camera_y) {
                (Some(name), Some(description), Some(date), Some(camera_x), Some(camera_y)) => {
                    ok &= self.add_bookmark(name, description, date, camera_x, camera_y);
                }
                _ => {
                    log::error!("bookmark is missing name, desc, date, cameraX or cameraY");
                    ok = false;
                }
            }
        }
        self.bookmarks.lock();
        ok
    }

    pub fn bookmarks(&self) -> &Registry<Bookmark> {
        &self.bookmarks
    }

    /// Latest date over all bookmarks; the epoch default if there are none.
    pub fn last_bookmark_date(&self) -> Date {
        self.bookmarks
            .items()
            .iter()
            .map(Bookmark::date)
            .max()
            .unwrap_or_default()
    }
}
