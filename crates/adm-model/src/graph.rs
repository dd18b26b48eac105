//! The resolved ADM object graph: an arena of nodes keyed by typed
//! indices. Cross-references only form cycles as parse-time back-pointer
//! artefacts; after resolution this is a DAG, so it is modelled as plain
//! index-based arenas rather than a reference-counted graph.

use crate::block_format::BlockFormat;
use serde::{Deserialize, Serialize};

macro_rules! typed_index {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub usize);
    };
}

typed_index!(ProgrammeId);
typed_index!(ContentId);
typed_index!(ObjectId);
typed_index!(PackFormatId);
typed_index!(ChannelFormatId);
typed_index!(TrackUidId);

/// The four ADM pack/channel format type paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackType {
    DirectSpeakers,
    Matrix,
    Objects,
    Hoa,
    Binaural,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioProgramme {
    pub id: String,
    pub name: String,
    pub content_refs: Vec<ContentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioContent {
    pub id: String,
    pub name: String,
    pub object_refs: Vec<ObjectId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioObject {
    pub id: String,
    pub name: String,
    pub pack_format_ref: Option<PackFormatId>,
    pub track_uid_refs: Vec<TrackUidId>,
    /// Nested sub-objects
    pub object_refs: Vec<ObjectId>,
    /// Groups of mutually-exclusive alternative objects; selection picks
    /// at most one member of each group
    pub complementary_object_groups: Vec<Vec<ObjectId>>,
    pub importance: Option<u8>,
    pub disabled: bool,
    pub interact: bool,
}

impl Default for AudioObject {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            pack_format_ref: None,
            track_uid_refs: Vec::new(),
            object_refs: Vec::new(),
            complementary_object_groups: Vec::new(),
            importance: None,
            disabled: false,
            interact: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPackFormat {
    pub id: String,
    pub name: String,
    pub pack_type: PackType,
    pub channel_format_refs: Vec<ChannelFormatId>,
    pub nested_pack_refs: Vec<PackFormatId>,
    pub normalization: Option<crate::block_format::Normalization>,
    pub nfc_ref_dist: Option<f64>,
    pub screen_ref: bool,
    pub importance: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChannelFormat {
    pub id: String,
    pub name: String,
    pub pack_type: PackType,
    pub block_formats: Vec<BlockFormat>,
}

/// Track index reserved for silent tracks (`ATU_00000000`).
pub const SILENT_TRACK_UID: &str = "ATU_00000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrackUid {
    pub id: String,
    /// 1-based physical track index from CHNA; `None` for the silent UID
    pub track_index: Option<u32>,
    pub pack_format_ref: Option<PackFormatId>,
    pub channel_format_ref: Option<ChannelFormatId>,
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u32>,
}

impl AudioTrackUid {
    pub fn is_silent(&self) -> bool {
        self.id == SILENT_TRACK_UID || self.track_index.is_none()
    }
}

/// The full resolved ADM document, read-only during rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adm {
    pub programmes: Vec<AudioProgramme>,
    pub contents: Vec<AudioContent>,
    pub objects: Vec<AudioObject>,
    pub pack_formats: Vec<AudioPackFormat>,
    pub channel_formats: Vec<AudioChannelFormat>,
    pub track_uids: Vec<AudioTrackUid>,
}

impl Adm {
    pub fn programme(&self, id: ProgrammeId) -> &AudioProgramme {
        &self.programmes[id.0]
    }
    pub fn content(&self, id: ContentId) -> &AudioContent {
        &self.contents[id.0]
    }
    pub fn object(&self, id: ObjectId) -> &AudioObject {
        &self.objects[id.0]
    }
    pub fn pack_format(&self, id: PackFormatId) -> &AudioPackFormat {
        &self.pack_formats[id.0]
    }
    pub fn channel_format(&self, id: ChannelFormatId) -> &AudioChannelFormat {
        &self.channel_formats[id.0]
    }
    pub fn track_uid(&self, id: TrackUidId) -> &AudioTrackUid {
        &self.track_uids[id.0]
    }

    /// The default programme selection: the first one, per spec §4.1.
    pub fn default_programme(&self) -> Option<ProgrammeId> {
        if self.programmes.is_empty() {
            None
        } else {
            Some(ProgrammeId(0))
        }
    }

    /// Find a pack format among a pack and its nested packs whose
    /// `channel_format_refs` contains `target`. Returns the id of the
    /// minimal (most deeply nested) pack that directly owns the channel
    /// format, per the item-selection grouping rule in spec §4.1.
    pub fn find_owning_pack(
        &self,
        root: PackFormatId,
        target: ChannelFormatId,
    ) -> Option<PackFormatId> {
        let pack = self.pack_format(root);
        if pack.channel_format_refs.contains(&target) {
            return Some(root);
        }
        for &nested in &pack.nested_pack_refs {
            if let Some(found) = self.find_owning_pack(nested, target) {
                return Some(found);
            }
        }
        None
    }
}
