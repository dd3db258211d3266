// src/services/leaderboard.rs

use std::cmp::Ordering;

use crate::models::{leaderboard::LeaderboardEntry, user::UserRecord};

/// Cosmetic tier attached to a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankTier {
    pub title: &'static str,
    pub icon: &'static str,
    pub badge_colors: [&'static str; 2],
}

const TOP_TEN: [&str; 10] = [
    "The Ultimate Boss",
    "Code Samurai",
    "Digital Warrior",
    "Tech Hero",
    "Cyber Champion",
    "Master Coder",
    "Elite Hacker",
    "Pro Genius",
    "Rising Star",
    "Code Ninja",
];

/// Title for a 1-based rank. Depends on the rank only.
pub fn title_for_rank(rank: u32) -> &'static str {
    match rank {
        1..=10 => TOP_TEN[(rank - 1) as usize],
        11..=25 => "Skilled Developer",
        26..=50 => "Coding Enthusiast",
        51..=100 => "Tech Explorer",
        _ => "Rising Talent",
    }
}

fn icon_for_rank(rank: u32) -> &'static str {
    match rank {
        1 => "👑",
        2 => "🥈",
        3 => "🥉",
        4..=10 => "🏆",
        11..=25 => "🌟",
        26..=50 => "⭐",
        _ => "🎯",
    }
}

fn badge_colors_for_rank(rank: u32) -> [&'static str; 2] {
    match rank {
        1 => ["#ffd700", "#ff6b6b"],
        2 => ["#c0c0c0", "#4ecdc4"],
        3 => ["#cd7f32", "#ff9a56"],
        4..=10 => ["#667eea", "#764ba2"],
        11..=25 => ["#48cae4", "#023e8a"],
        26..=50 => ["#40e0d0", "#ee82ee"],
        _ => ["#98d8c8", "#f7dc6f"],
    }
}

pub fn tier_for_rank(rank: u32) -> RankTier {
    RankTier {
        title: title_for_rank(rank),
        icon: icon_for_rank(rank),
        badge_colors: badge_colors_for_rank(rank),
    }
}

/// Leaderboard order: points descending, then earliest registration, then id.
pub fn leaderboard_order(a: &UserRecord, b: &UserRecord) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Whether `other` is ranked ahead of `user`.
pub fn is_ahead(other: &UserRecord, user: &UserRecord) -> bool {
    leaderboard_order(other, user) == Ordering::Less
}

pub fn entry(user: &UserRecord, rank: u32) -> LeaderboardEntry {
    let tier = tier_for_rank(rank);
    LeaderboardEntry {
        rank,
        user_id: user.id.clone(),
        name: user.name().to_string(),
        college: user.college_or_default().to_string(),
        avatar: user.avatar_url(),
        points: user.points,
        streak: user.streak,
        badge_count: user.badge_count,
        title: tier.title,
        icon: tier.icon,
        badge_colors: tier.badge_colors,
    }
}

/// Projects a snapshot of user records into the top `n` ranked entries.
///
/// Users without points never appear. Ranks are `1 + index` in the
/// filtered, ordered sequence.
pub fn project(mut users: Vec<UserRecord>, n: usize) -> Vec<LeaderboardEntry> {
    users.retain(|u| u.points > 0);
    users.sort_by(leaderboard_order);
    users
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, u)| entry(u, i as u32 + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(id: &str, points: i64, joined_minutes_ago: i64) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            display_name: Some(id.to_uppercase()),
            email: None,
            college: None,
            photo_url: None,
            points,
            aura: 0,
            streak: 0,
            badge_count: 0,
            created_at: Utc::now() - Duration::minutes(joined_minutes_ago),
        }
    }

    #[test]
    fn zero_point_users_are_excluded_and_ties_break_by_registration() {
        let users = vec![
            user("c", 50, 30),
            user("d", 0, 40),
            user("b", 100, 10),
            user("a", 100, 20),
        ];

        let board = project(users, 10);
        let ids: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(board[2].rank, 3);
        assert_eq!(board[0].title, "The Ultimate Boss");
    }

    #[test]
    fn top_n_is_sorted_and_bounded() {
        let users: Vec<UserRecord> = (0..30)
            .map(|i| user(&format!("u{}", i), (i * 7 % 11) as i64, i))
            .collect();
        let eligible = users.iter().filter(|u| u.points > 0).count();

        let board = project(users.clone(), 5);
        assert_eq!(board.len(), 5.min(eligible));
        assert!(board.windows(2).all(|w| w[0].points >= w[1].points));

        let all = project(users, 1000);
        assert_eq!(all.len(), eligible);
        assert!(all.iter().all(|e| e.points > 0));
    }

    #[test]
    fn titles_depend_only_on_rank() {
        assert_eq!(title_for_rank(5), title_for_rank(5));
        assert_eq!(title_for_rank(5), "Cyber Champion");
        assert_eq!(title_for_rank(10), "Code Ninja");
        assert_eq!(title_for_rank(11), "Skilled Developer");
        assert_eq!(title_for_rank(25), "Skilled Developer");
        assert_eq!(title_for_rank(26), "Coding Enthusiast");
        assert_eq!(title_for_rank(100), "Tech Explorer");
        assert_eq!(title_for_rank(101), "Rising Talent");
    }

    #[test]
    fn podium_has_distinct_icons() {
        assert_eq!(tier_for_rank(1).icon, "👑");
        assert_eq!(tier_for_rank(2).icon, "🥈");
        assert_eq!(tier_for_rank(3).icon, "🥉");
        assert_eq!(tier_for_rank(3).badge_colors, ["#cd7f32", "#ff9a56"]);
    }
}
