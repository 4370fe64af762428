use tracing::{error, warn};

use crate::models::{Difficulty, HistoryContainer, RaidChange, RaidDefinition};
use crate::utils::truncate_string;

use super::Notifier;

/// Longest message handed to a notifier.
pub const MAX_MESSAGE_LENGTH: usize = 280;

/// Message for one group's new kills in one raid at one difficulty, e.g.
/// `Raided-X killed 2 new bosses in Heroic Battle of Dazar'alor to be 9/9H! #aotc`.
///
/// `#aotc` is added when a heroic or mythic clear is completed.
pub fn kill_message(group: &str, change: &RaidChange, raid: &RaidDefinition) -> String {
    let kills = change.killed.len();
    let noun = if kills == 1 { "boss" } else { "bosses" };
    let total = raid.boss_count();

    let mut text = format!(
        "{} killed {} new {} in {} {} to be {}/{}{}!",
        group,
        kills,
        noun,
        change.difficulty.label(),
        raid.name,
        change.new_total,
        total,
        change.difficulty.initial()
    );
    if change.difficulty != Difficulty::Normal && change.new_total as usize == total {
        text.push_str(" #aotc");
    }
    truncate_string(&text, MAX_MESSAGE_LENGTH)
}

/// Publish every unannounced entry in `container` and mark it announced.
///
/// Messages go out per group (in name order), per raid in catalog order, and
/// hardest difficulty first. An entry is marked announced even when its
/// messages fail to publish so a broken notifier does not cause reposts.
/// Returns the number of messages published successfully.
pub fn announce<N: Notifier + ?Sized>(
    container: &mut HistoryContainer,
    catalog: &[RaidDefinition],
    notifier: &N,
) -> usize {
    let mut published = 0;

    for entry in container.entries.iter_mut().filter(|e| !e.announced) {
        entry.announced = true;

        for raid in catalog {
            for difficulty in Difficulty::ALL.iter().rev() {
                let Some(change) = entry
                    .changes
                    .iter()
                    .find(|c| c.raid == raid.slug && c.difficulty == *difficulty)
                else {
                    continue;
                };
                if change.killed.is_empty() {
                    continue;
                }

                let text = kill_message(&entry.group, change, raid);
                match notifier.publish(&text) {
                    Ok(()) => published += 1,
                    Err(e) => {
                        error!(group = %entry.group, error = %e, "Failed to publish announcement")
                    }
                }
            }
        }

        for change in &entry.changes {
            if !catalog.iter().any(|r| r.slug == change.raid) {
                warn!(
                    group = %entry.group,
                    raid = %change.raid,
                    "History names a raid outside the catalog, not announced"
                );
            }
        }
    }

    published
}
