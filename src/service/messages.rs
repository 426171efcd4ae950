//! Caller-facing result messages.

pub const ITEM_NOT_EXIST: &str = "ToDo Item Not Exist!";
pub const ITEM_NOT_FOUND: &str = "ToDo Item Not Found!";
pub const ITEM_NOT_FOUND_FOR_SHARING: &str = "ToDoItem Not Found!";
pub const ITEM_UPDATED_BY_OTHERS: &str = "ToDo Item Is Updated By Others!";
pub const ITEM_AND_TAGS_SAME: &str = "ToDo Item And Tags Are Same!";
pub const INVALID_STATUS: &str =
    "ToDo Item Status Not Correct, Only Accepts Not Started, In Progress or Completed!";
pub const INVALID_PRIORITY: &str =
    "ToDo Item Priority Not Correct, Only Accepts Low, Medium or High!";
pub const USERS_TO_SHARE_SAME: &str = "Users To Be Shared Are Same!";
pub const INVALID_VERSION: &str = "Concurrency token is required";
pub const INVALID_PAGE: &str = "Limit and offset must not exceed 9223372036854775807";

pub const CANNOT_ACCESS: &str = "You Cannot Access This ToDo Item!";
pub const CANNOT_UPDATE: &str = "You Cannot Update This ToDo Item!";
pub const CANNOT_DELETE: &str = "You Cannot Delete This ToDo Item!";
pub const CANNOT_SHARE: &str = "You Cannot Share This ToDo Item!";

pub const CREATE_ITEM_SUCCESS: &str = "Create ToDo Item Successfully!";
pub const CREATE_ITEM_FAILED: &str = "Create ToDo Item Failed!";
pub const GET_ITEM_SUCCESS: &str = "Get ToDo Item Successfully!";
pub const GET_ITEM_FAILED: &str = "Get ToDo Item Failed!";
pub const GET_ITEMS_SUCCESS: &str = "Get ToDo Items Successfully!";
pub const GET_ITEMS_FAILED: &str = "Get ToDo Items Failed!";
pub const UPDATE_ITEM_SUCCESS: &str = "Update ToDo Item Successfully!";
pub const UPDATE_ITEM_FAILED: &str = "Update ToDo Item Failed!";
pub const DELETE_ITEM_SUCCESS: &str = "Delete ToDo Item Successfully!";
pub const DELETE_ITEM_FAILED: &str = "Delete ToDo Item Failed!";
pub const SHARE_ITEM_SUCCESS: &str = "Share ToDo Item Successfully!";
pub const SHARE_ITEM_FAILED: &str = "Share ToDo Item Failed!";
pub const AVAILABLE_USERS_SUCCESS: &str = "Get Available Users To Share Successfully!";
pub const AVAILABLE_USERS_FAILED: &str = "Get Available Users To Share Failed!";

pub const USER_NOT_FOUND: &str = "User Not Found!";
pub const USER_ALREADY_EXISTS: &str = "User Already Exists!";
pub const USER_CREATED: &str = "User Created Successfully!";
pub const REGISTER_FAILED: &str = "Register Failed!";
pub const INVALID_EMAIL: &str = "You have entered an invalid email address";
pub const USERNAME_REQUIRED: &str = "Username is required";
pub const WEAK_PASSWORD: &str = "Minimum eight characters, at least one uppercase letter, one lowercase letter, one number and one special character";
pub const LOGIN_SUCCESS: &str = "Login Successfully!";
pub const LOGIN_FAILED: &str = "Login Failed!";
pub const LOGOUT_SUCCESS: &str = "Logout Successfully!";
pub const LOGOUT_FAILED: &str = "Logout Failed!";
pub const NOT_AUTHENTICATED: &str = "Authentication Required!";
pub const ADMIN_ONLY: &str = "Only Admin Can Manage Users!";

pub const GET_USERS_SUCCESS: &str = "Get Users Successfully!";
pub const GET_USERS_FAILED: &str = "Get Users Failed!";
pub const GET_USER_SUCCESS: &str = "Get User Successfully!";
pub const GET_USER_FAILED: &str = "Get User Failed!";
pub const ROLE_NOT_FOUND: &str = "Role Not Found!";
pub const ROLE_IS_SAME: &str = "Role Is Same!";
pub const USER_UPDATED_BY_OTHERS: &str = "User Is Updated By Others!";
pub const CHANGE_ROLE_SUCCESS: &str = "Change User Role Successfully!";
pub const CHANGE_ROLE_FAILED: &str = "Change User Role Failed!";
