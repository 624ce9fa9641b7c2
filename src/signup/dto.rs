use serde::Deserialize;

/// Signup form body. Absent fields are empty.
#[derive(Debug, Default)]
pub struct SignupForm {
    pub fullname: String,
    pub email: String,
    pub idnumber: String,
    pub role: String,
    pub agree: Option<String>, // checkbox, only sent when ticked
}

impl SignupForm {
    /// Build from raw urlencoded pairs. A repeated key keeps its first value
    /// and unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let (mut fullname, mut email, mut idnumber, mut role) = (None, None, None, None);
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "fullname" => &mut fullname,
                "email" => &mut email,
                "idnumber" => &mut idnumber,
                "role" => &mut role,
                "agree" => &mut form.agree,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        form.fullname = fullname.unwrap_or_default();
        form.email = email.unwrap_or_default();
        form.idnumber = idnumber.unwrap_or_default();
        form.role = role.unwrap_or_default();
        form
    }
}

/// Query string of `/download_csv`.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: Option<String>,
}
