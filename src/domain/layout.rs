// Grid layout domain model
use super::ids::{DashboardId, WidgetId};
use super::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Viewport width tier. Each tier has its own column count and geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
    Xs,
    Xxs,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Lg,
        Breakpoint::Md,
        Breakpoint::Sm,
        Breakpoint::Xs,
        Breakpoint::Xxs,
    ];

    pub fn columns(self) -> u32 {
        match self {
            Breakpoint::Lg => 12,
            Breakpoint::Md => 10,
            Breakpoint::Sm => 6,
            Breakpoint::Xs => 4,
            Breakpoint::Xxs => 2,
        }
    }

    /// Minimum container width (px) at which this tier applies.
    pub fn min_width(self) -> u32 {
        match self {
            Breakpoint::Lg => 1200,
            Breakpoint::Md => 996,
            Breakpoint::Sm => 768,
            Breakpoint::Xs => 480,
            Breakpoint::Xxs => 0,
        }
    }

    pub fn for_width(width: u32) -> Breakpoint {
        Self::ALL
            .into_iter()
            .find(|bp| width >= bp.min_width())
            .unwrap_or(Breakpoint::Xxs)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Breakpoint::Lg => "lg",
            Breakpoint::Md => "md",
            Breakpoint::Sm => "sm",
            Breakpoint::Xs => "xs",
            Breakpoint::Xxs => "xxs",
        }
    }
}

/// Size and position of a widget, without its identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPlacement {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
}

impl GridPlacement {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            ..Default::default()
        }
    }

    pub fn with_min(mut self, min_w: u32, min_h: u32) -> Self {
        self.min_w = Some(min_w);
        self.min_h = Some(min_h);
        self
    }

    pub fn with_max(mut self, max_w: u32, max_h: u32) -> Self {
        self.max_w = Some(max_w);
        self.max_h = Some(max_h);
        self
    }

    pub fn pinned(mut self) -> Self {
        self.is_static = Some(true);
        self
    }

    pub fn at(self, widget_id: WidgetId) -> GridItem {
        GridItem {
            i: widget_id,
            placement: self,
        }
    }
}

/// One widget's rectangle within one breakpoint. Wire shape:
/// `{ i, x, y, w, h, minW?, minH?, maxW?, maxH?, static? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub i: WidgetId,
    #[serde(flatten)]
    pub placement: GridPlacement,
}

impl GridItem {
    pub fn widget_id(&self) -> &WidgetId {
        &self.i
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let p = &self.placement;
        if p.w < 1 {
            return Err(ValidationError::new(format!("{}.w", self.i), "must be at least 1"));
        }
        if p.h < 1 {
            return Err(ValidationError::new(format!("{}.h", self.i), "must be at least 1"));
        }
        if p.min_w == Some(0) {
            return Err(ValidationError::new(format!("{}.minW", self.i), "must be at least 1"));
        }
        if p.min_h == Some(0) {
            return Err(ValidationError::new(format!("{}.minH", self.i), "must be at least 1"));
        }
        Ok(())
    }

    fn merge(&self, update: &GridItemUpdate) -> GridItem {
        let mut p = self.placement;
        if let Some(x) = update.x {
            p.x = x;
        }
        if let Some(y) = update.y {
            p.y = y;
        }
        if let Some(w) = update.w {
            p.w = w;
        }
        if let Some(h) = update.h {
            p.h = h;
        }
        if update.min_w.is_some() {
            p.min_w = update.min_w;
        }
        if update.min_h.is_some() {
            p.min_h = update.min_h;
        }
        if update.max_w.is_some() {
            p.max_w = update.max_w;
        }
        if update.max_h.is_some() {
            p.max_h = update.max_h;
        }
        if update.is_static.is_some() {
            p.is_static = update.is_static;
        }
        GridItem {
            i: self.i.clone(),
            placement: p,
        }
    }
}

/// Partial geometry update; `Some` fields overwrite, `None` fields are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItemUpdate {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub min_w: Option<u32>,
    pub min_h: Option<u32>,
    pub max_w: Option<u32>,
    pub max_h: Option<u32>,
    #[serde(rename = "static")]
    pub is_static: Option<bool>,
}

impl GridItemUpdate {
    pub fn moved_to(x: u32, y: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn resized_to(w: u32, h: u32) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
            ..Default::default()
        }
    }
}

/// Per-breakpoint item sequences.
///
/// Every transformation returns a new value; the receiver is never modified,
/// so snapshots held elsewhere (undo entries, last-saved copies) stay valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridLayout(BTreeMap<Breakpoint, Vec<GridItem>>);

impl GridLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_breakpoint(mut self, breakpoint: Breakpoint, items: Vec<GridItem>) -> Self {
        self.0.insert(breakpoint, items);
        self
    }

    /// Empty sequences for the tiers a freshly created dashboard starts with.
    pub fn blank() -> Self {
        Self::new()
            .with_breakpoint(Breakpoint::Lg, Vec::new())
            .with_breakpoint(Breakpoint::Md, Vec::new())
            .with_breakpoint(Breakpoint::Sm, Vec::new())
    }

    pub fn items(&self, breakpoint: Breakpoint) -> Option<&[GridItem]> {
        self.0.get(&breakpoint).map(Vec::as_slice)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = Breakpoint> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn widget_ids(&self, breakpoint: Breakpoint) -> Vec<WidgetId> {
        self.items(breakpoint)
            .map(|items| items.iter().map(|item| item.i.clone()).collect())
            .unwrap_or_default()
    }

    /// Append `placement` for `widget_id` to every breakpoint, creating the
    /// tiers that are missing.
    pub fn with_widget_added(&self, widget_id: &WidgetId, placement: GridPlacement) -> Self {
        let mut next = BTreeMap::new();
        for breakpoint in Breakpoint::ALL {
            let mut items = self.0.get(&breakpoint).cloned().unwrap_or_default();
            items.retain(|item| &item.i != widget_id);
            items.push(placement.at(widget_id.clone()));
            next.insert(breakpoint, items);
        }
        Self(next)
    }

    pub fn without_widget(&self, widget_id: &WidgetId) -> Self {
        Self(
            self.0
                .iter()
                .map(|(bp, items)| {
                    let kept = items.iter().filter(|item| &item.i != widget_id).cloned().collect();
                    (*bp, kept)
                })
                .collect(),
        )
    }

    pub fn with_widget_updated(&self, widget_id: &WidgetId, update: &GridItemUpdate) -> Self {
        Self(
            self.0
                .iter()
                .map(|(bp, items)| {
                    let merged = items
                        .iter()
                        .map(|item| {
                            if &item.i == widget_id {
                                item.merge(update)
                            } else {
                                item.clone()
                            }
                        })
                        .collect();
                    (*bp, merged)
                })
                .collect(),
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (breakpoint, items) in &self.0 {
            let mut seen = HashSet::new();
            for item in items {
                item.validate()?;
                if !seen.insert(&item.i) {
                    return Err(ValidationError::new(
                        format!("layouts.{}", breakpoint.as_str()),
                        format!("duplicate widget id {}", item.i),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Persisted aggregate for one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLayout {
    pub dashboard_id: DashboardId,
    pub layouts: GridLayout,
    #[serde(default)]
    pub widgets: Vec<WidgetId>,
}

impl DashboardLayout {
    pub fn new(dashboard_id: DashboardId, layouts: GridLayout) -> Self {
        Self {
            dashboard_id,
            layouts,
            widgets: Vec::new(),
        }
    }
}
