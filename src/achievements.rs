//! Achievement goals
//!
//! The game hands a stats snapshot over after every pop; this module decides
//! what that unlocks. Unlocks persist through the `Storage` trait.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, load_or_default, save_or_warn};
use crate::sim::{BubbleKind, Fragments};

/// Stats the game reports after each pop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub daily_pops: u32,
    pub fragments: Fragments,
    pub zen_time_ms: f64,
    pub login_streak: u32,
    pub challenges_completed: u32,
}

/// Anything that can turn a snapshot into newly unlocked achievement ids
pub trait AchievementTracker {
    /// Returns only ids unlocked by this call
    fn check(&mut self, stats: &StatsSnapshot) -> Vec<&'static str>;
}

/// A fixed goal
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    goal: fn(&StatsSnapshot) -> bool,
}

pub static ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        id: "ACH001",
        title: "Bubble Master",
        description: "Pop 100 bubbles in one day",
        goal: |s| s.daily_pops >= 100,
    },
    Achievement {
        id: "ACH002",
        title: "Gold Collector",
        description: "Collect 50 golden fragments",
        goal: |s| s.fragments.get(BubbleKind::Golden) >= 50,
    },
    Achievement {
        id: "ACH003",
        title: "Rainbow Hunter",
        description: "Collect 10 rainbow fragments",
        goal: |s| s.fragments.get(BubbleKind::Rainbow) >= 10,
    },
    Achievement {
        id: "ACH004",
        title: "Zen Master",
        description: "Spend 10 minutes in zen mode",
        goal: |s| s.zen_time_ms >= 600_000.0,
    },
    Achievement {
        id: "ACH005",
        title: "Regular",
        description: "Log in 3 days in a row",
        goal: |s| s.login_streak >= 3,
    },
    Achievement {
        id: "ACH006",
        title: "Challenge Conqueror",
        description: "Complete 5 challenges",
        goal: |s| s.challenges_completed >= 5,
    },
];

/// A recorded unlock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockEntry {
    pub id: String,
    /// Unix timestamp (ms) when unlocked
    pub timestamp: f64,
}

/// Persisted unlock list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementBook {
    pub unlocked: Vec<UnlockEntry>,
    /// Clock used to stamp unlocks
    #[serde(skip)]
    now_ms: f64,
}

impl AchievementBook {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bubble_pop_achievements";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(storage: &dyn Storage) -> Self {
        let book: Self = load_or_default(storage, Self::STORAGE_KEY);
        log::info!("{} achievements unlocked", book.unlocked.len());
        book
    }

    pub fn save(&self, storage: &mut dyn Storage) -> bool {
        save_or_warn(storage, Self::STORAGE_KEY, self)
    }

    /// Set the wall-clock time used for new unlock stamps
    pub fn set_now(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|e| e.id == id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Share of goals reached, 0-100
    pub fn completion_percentage(&self) -> f32 {
        self.unlocked_count() as f32 / ACHIEVEMENTS.len() as f32 * 100.0
    }

    /// Look up an achievement definition
    pub fn find(id: &str) -> Option<&'static Achievement> {
        ACHIEVEMENTS.iter().find(|a| a.id == id)
    }
}

impl AchievementTracker for AchievementBook {
    fn check(&mut self, stats: &StatsSnapshot) -> Vec<&'static str> {
        let mut newly = Vec::new();
        for achievement in &ACHIEVEMENTS {
            if !self.is_unlocked(achievement.id) && (achievement.goal)(stats) {
                self.unlocked.push(UnlockEntry {
                    id: achievement.id.to_string(),
                    timestamp: self.now_ms,
                });
                log::info!("Achievement unlocked: {}", achievement.title);
                newly.push(achievement.id);
            }
        }
        newly
    }
}

/// Tracks achievements and writes unlocks straight to storage
pub struct PersistentAchievements<S: Storage> {
    pub book: AchievementBook,
    pub storage: S,
}

impl<S: Storage> PersistentAchievements<S> {
    pub fn load(storage: S) -> Self {
        let book = AchievementBook::load(&storage);
        Self { book, storage }
    }
}

impl<S: Storage> AchievementTracker for PersistentAchievements<S> {
    fn check(&mut self, stats: &StatsSnapshot) -> Vec<&'static str> {
        let newly = self.book.check(stats);
        if !newly.is_empty() {
            self.book.save(&mut self.storage);
        }
        newly
    }
}
