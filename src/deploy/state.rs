// ABOUTME: Pipeline state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce the phase order at compile time.

/// Created, nothing checked yet.
/// Available actions: `run_preflight()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Preflight checks passed. Nothing mutated yet.
/// Available actions: `preview_diff()`, `acquire_lock()`
#[derive(Debug, Clone, Copy, Default)]
pub struct PreChecked;

/// Stage lock held (or skipped in dry run).
/// Available actions: `build()`, `fail()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Locked;

/// Build finished.
/// Available actions: `deploy()`, `fail()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Built;

/// Delegated deploy finished, maintenance window possibly still open.
/// Available actions: `validate_health()`, `fail()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Deployed;

/// Health checks passed.
/// Available actions: `release()`, `fail()`
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthValidated;

/// Maintenance restored and lock released.
/// Available actions: `invalidate_cache()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Released;

/// CDN cache invalidated (or skipped).
/// Available actions: `audit()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Invalidated;

/// Audit done.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;
