//! Database schema for radio.db.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const STATION_TABLE_V0: Table = Table {
    name: "station",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("code", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("stream_url", &SqlType::Text, non_null = true),
        sqlite_column!("metadata_url", &SqlType::Text, non_null = true),
        // Upstream now-playing feed proxied by the metadata endpoint
        sqlite_column!("upstream_metadata_url", &SqlType::Text),
        sqlite_column!(
            "is_active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "display_order",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("stream_format", &SqlType::Text),
        sqlite_column!("stream_quality", &SqlType::Text),
        sqlite_column!("stream_codec", &SqlType::Text),
        sqlite_column!("stream_bitrate", &SqlType::Text),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("tagline", &SqlType::Text),
        sqlite_column!("logo_url", &SqlType::Text),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("source_info", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["code"]],
};

const SONG_TABLE_V0: Table = Table {
    name: "song",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "station_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "station",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "thumbs_up_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "thumbs_down_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("updated", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["station_id", "artist", "title"]],
};

const RATING_TABLE_V0: Table = Table {
    name: "rating",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "song_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "song",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("ip_address", &SqlType::Text, non_null = true),
        sqlite_column!("rating_type", &SqlType::Text, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("updated", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_rating_ip_created", "ip_address, created")],
    unique_constraints: &[&["song_id", "user_id"]],
};

pub const RADIO_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[STATION_TABLE_V0, SONG_TABLE_V0, RATING_TABLE_V0],
    migration: None,
}];
