use crate::output::color::ColorWriter;
use crate::store::{ConversationRecord, StoredConversation, Team, User};
use std::io::Result;
use termcolor::Color;

pub fn format_users(users: &[User], writer: &mut ColorWriter) -> Result<()> {
    writer.print_header(&format!("Users ({})", users.len()))?;

    for user in users {
        writer.print_colored(&format!("{:>4}", user.id), Color::Yellow)?;
        writer.write("  ")?;
        writer.print_bold(&user.user_name)?;
        writer.write(" ")?;
        writer.print_dim(&format!("[{}]", user.user_key))?;
        writer.write(&format!("  grade {}  team {}", user.grade, user.team_key))?;
        writer.writeln()?;
    }

    Ok(())
}

pub fn format_teams(teams: &[Team], writer: &mut ColorWriter) -> Result<()> {
    writer.print_header(&format!("Channels ({})", teams.len()))?;

    for team in teams {
        writer.print_colored(&format!("{:>4}", team.id), Color::Yellow)?;
        writer.write("  ")?;
        writer.print_bold(&format!("#{}", team.channel_name))?;
        writer.write(" ")?;
        writer.print_dim(&format!("[{}]", team.channel_id))?;
        writer.writeln()?;
    }

    Ok(())
}

fn format_line(timestamp: &str, user_id: &str, text: &str, writer: &mut ColorWriter) -> Result<()> {
    let author = if user_id.is_empty() { "(system)" } else { user_id };

    writer.print_dim(timestamp)?;
    writer.write("  ")?;
    writer.print_colored(author, Color::Green)?;
    writer.write("  ")?;

    // Continuation lines line up under the text column.
    let indent = " ".repeat(timestamp.chars().count() + 2 + author.chars().count() + 2);
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            writer.writeln()?;
            writer.write(&indent)?;
        }
        writer.write(line)?;
    }
    writer.writeln()
}

pub fn format_conversations(
    channel_id: &str,
    records: &[ConversationRecord],
    writer: &mut ColorWriter,
) -> Result<()> {
    writer.print_header(&format!("Channel {} ({} messages)", channel_id, records.len()))?;

    for record in records {
        format_line(&record.timestamp, &record.user_id, &record.text, writer)?;
    }

    Ok(())
}

pub fn format_stored_conversations(
    channel_id: &str,
    stored: &[StoredConversation],
    writer: &mut ColorWriter,
) -> Result<()> {
    writer.print_header(&format!("Stored history for {} ({} messages)", channel_id, stored.len()))?;

    if stored.is_empty() {
        writer.print_dim("Nothing stored yet; run `history --save` first.")?;
        writer.writeln()?;
        return Ok(());
    }

    for message in stored {
        format_line(&message.timestamp, &message.user_id, &message.text, writer)?;
    }

    Ok(())
}
