use crate::database::models::{ProfileUpdate, UserRecord};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const USER_COLUMNS: &str = "id, email, password_hash, name, surname, patronymic, birthday, \
     phone_number, is_banned, permissions, registration_date, \
     show_first_name, show_surname, show_email, show_phone, hide_profile, \
     notify_new_comment, notify_new_like, notify_new_subscriber, notify_new_offers, \
     about_text, screen_name, avatar_name";

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        surname: row.get(4)?,
        patronymic: row.get(5)?,
        birthday: row.get(6)?,
        phone_number: row.get(7)?,
        is_banned: row.get(8)?,
        permissions: row.get(9)?,
        registration_date: row.get(10)?,
        show_first_name: row.get(11)?,
        show_surname: row.get(12)?,
        show_email: row.get(13)?,
        show_phone: row.get(14)?,
        hide_profile: row.get(15)?,
        notify_new_comment: row.get(16)?,
        notify_new_like: row.get(17)?,
        notify_new_subscriber: row.get(18)?,
        notify_new_offers: row.get(19)?,
        about_text: row.get(20)?,
        screen_name: row.get(21)?,
        avatar_name: row.get(22)?,
    })
}

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO users ({USER_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                  ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
            ),
            params![
                record.id,
                record.email,
                record.password_hash,
                record.name,
                record.surname,
                record.patronymic,
                record.birthday,
                record.phone_number,
                record.is_banned,
                record.permissions,
                record.registration_date,
                record.show_first_name,
                record.show_surname,
                record.show_email,
                record.show_phone,
                record.hide_profile,
                record.notify_new_comment,
                record.notify_new_like,
                record.notify_new_subscriber,
                record.notify_new_offers,
                record.about_text,
                record.screen_name,
                record.avatar_name,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                map_user_row,
            )
            .optional()?)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                map_user_row,
            )
            .optional()?)
    }

    fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<bool> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        macro_rules! assign {
            ($field:ident, $column:literal) => {
                if let Some(value) = &update.$field {
                    assignments.push(concat!($column, " = ?"));
                    values.push(value.clone().into());
                }
            };
        }

        assign!(email, "email");
        assign!(name, "name");
        assign!(surname, "surname");
        assign!(patronymic, "patronymic");
        assign!(birthday, "birthday");
        assign!(phone_number, "phone_number");
        assign!(show_first_name, "show_first_name");
        assign!(show_surname, "show_surname");
        assign!(show_email, "show_email");
        assign!(show_phone, "show_phone");
        assign!(hide_profile, "hide_profile");
        assign!(notify_new_comment, "notify_new_comment");
        assign!(notify_new_like, "notify_new_like");
        assign!(notify_new_subscriber, "notify_new_subscriber");
        assign!(notify_new_offers, "notify_new_offers");
        assign!(about_text, "about_text");
        assign!(screen_name, "screen_name");

        if assignments.is_empty() {
            return Ok(true);
        }

        let sql = format!("UPDATE users SET {} WHERE id = ?", assignments.join(", "));
        values.push(id.to_string().into());
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(changed > 0)
    }

    fn set_avatar(&self, id: &str, avatar_name: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE users SET avatar_name = ?1 WHERE id = ?2",
            params![avatar_name, id],
        )?;
        Ok(changed > 0)
    }

    fn set_banned(&self, id: &str, banned: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE users SET is_banned = ?1 WHERE id = ?2",
            params![banned, id],
        )?;
        Ok(changed > 0)
    }
}
