//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (station codes, fake artwork, etc.),
//! update only this file.

// ============================================================================
// Test Stations
// ============================================================================

/// Active station with an upstream now-playing feed
pub const ENGLISH_STATION: &str = "ENGLISH";

/// Active station without an upstream feed
pub const HINDI_STATION: &str = "HINDI";

/// Display name of the Hindi station, used by fallback metadata
pub const HINDI_STATION_NAME: &str = "Hindi Classics";

/// Station that exists but is not listed as active
pub const INACTIVE_STATION: &str = "ARCHIVE";

/// Station code that is never configured
pub const UNKNOWN_STATION: &str = "NOWHERE";

// ============================================================================
// Fake Artwork Search
// ============================================================================

/// The only artist the fake search knows about
pub const KNOWN_ARTIST: &str = "Queen";

/// The only title the fake search knows about
pub const KNOWN_TITLE: &str = "Bohemian Rhapsody";

/// Low resolution URL returned by the fake search
pub const KNOWN_ARTWORK_URL: &str = "https://artwork.test/queen/100x100bb.jpg";

/// What the resolver serves for the known track
pub const KNOWN_ARTWORK_URL_HIGH_RES: &str = "https://artwork.test/queen/600x600bb.jpg";

/// Placeholder image base configured on the test server
pub const FALLBACK_IMAGE_BASE: &str = "https://placeholder.test/300x300.png";

// ============================================================================
// Upstream Metadata Feed
// ============================================================================

/// Track reported by the fake upstream feed of the English station
pub const UPSTREAM_ARTIST: &str = KNOWN_ARTIST;
pub const UPSTREAM_TITLE: &str = KNOWN_TITLE;
pub const UPSTREAM_ALBUM: &str = "A Night at the Opera";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Default timeout for HTTP requests in tests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
