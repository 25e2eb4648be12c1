#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Already hashed; repositories never see plain passwords
    pub password_hash: String,
    pub is_admin: bool,
}
