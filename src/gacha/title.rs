//! Equipped title slot. Titles come only from claimed achievements.
use crate::gacha::achievement::AchievementBook;
use crate::gacha::errors::GachaError;
use crate::gacha::types::UserProgress;

/// Titles unlocked by the user's claimed achievements, in book order.
pub fn owned_titles<'b>(progress: &UserProgress, book: &'b AchievementBook) -> Vec<&'b str> {
    book.iter()
        .filter(|def| progress.claimed_achievements.contains(&def.id))
        .filter_map(|def| def.title.as_deref())
        .collect()
}

/// Equip `title`, replacing whatever was equipped.
pub fn equip_title(
    progress: &mut UserProgress,
    book: &AchievementBook,
    title: &str,
) -> Result<(), GachaError> {
    if !owned_titles(progress, book).contains(&title) {
        return Err(GachaError::TitleNotOwned(title.to_string()));
    }
    progress.equipped_title = Some(title.to_string());
    Ok(())
}
